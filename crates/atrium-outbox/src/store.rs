use async_trait::async_trait;
use chrono::{DateTime, Utc};

use atrium_domain::event::BusinessDomain;

use crate::record::OutboxRecord;

/// Engine-level storage failure. Wraps whatever the backing store raised;
/// the dispatcher treats it as transient and retries on the next wake.
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("outbox storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Storage port for the delivery side of the outbox.
///
/// Enqueueing is deliberately absent: rows are inserted by the business
/// repositories inside their own transactions, which is the whole point of
/// the pattern.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// The oldest pending row for `domain` whose `next_attempt_at` has
    /// passed, or `None` when the queue is drained (or only backing off).
    async fn next_pending(
        &self,
        domain: BusinessDomain,
    ) -> Result<Option<OutboxRecord>, OutboxError>;

    /// Mark a row delivered. Must be a no-op when the row is already
    /// delivered, so crash-and-retry re-delivery converges.
    async fn mark_delivered(&self, id: i64) -> Result<(), OutboxError>;

    /// Record a failed attempt: bump the attempt counter, remember the
    /// error, and hold the row back until `retry_at`.
    async fn record_failure(
        &self,
        id: i64,
        error: &str,
        retry_at: DateTime<Utc>,
    ) -> Result<(), OutboxError>;
}

/// Mutual exclusion between dispatcher instances, keyed by business domain.
///
/// A single resource with no nested acquisition, so there is no deadlock
/// potential. Implementations back this with a lock table so the guarantee
/// holds across service replicas.
#[async_trait]
pub trait DomainLock: Send + Sync {
    /// Attempt to take the domain lock. Returns `false` without blocking
    /// when another holder has it.
    async fn try_acquire(&self, domain: BusinessDomain) -> Result<bool, OutboxError>;

    /// Release the lock. Only the current holder's release has effect.
    async fn release(&self, domain: BusinessDomain) -> Result<(), OutboxError>;
}
