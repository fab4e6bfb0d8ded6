//! In-memory outbox store and domain lock.
//!
//! Used by tests and by single-process setups that want the dispatch
//! semantics without a database. The database-backed implementations live in
//! the service's `infra` layer.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use atrium_domain::event::{BusinessDomain, EventPayload};

use crate::record::OutboxRecord;
use crate::store::{DomainLock, OutboxError, OutboxStore};

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    rows: Vec<OutboxRecord>,
}

/// Outbox rows held in process memory.
#[derive(Clone, Default)]
pub struct MemoryOutboxStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryOutboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pending row, the in-memory analogue of the transactional
    /// insert the database helpers perform. Returns the row id.
    pub fn enqueue(&self, payload: &EventPayload) -> i64 {
        let now = Utc::now();
        let mut state = self.inner.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.rows.push(OutboxRecord {
            id,
            domain: payload.domain(),
            kind: payload.kind(),
            content: serde_json::to_value(payload).expect("event payloads always serialize"),
            attempts: 0,
            last_error: None,
            created_at: now,
            next_attempt_at: now,
            delivered_at: None,
        });
        id
    }

    /// Snapshot of every row, for assertions.
    pub fn records(&self) -> Vec<OutboxRecord> {
        self.inner.lock().unwrap().rows.clone()
    }

    pub fn record(&self, id: i64) -> Option<OutboxRecord> {
        self.inner
            .lock()
            .unwrap()
            .rows
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }
}

#[async_trait]
impl OutboxStore for MemoryOutboxStore {
    async fn next_pending(
        &self,
        domain: BusinessDomain,
    ) -> Result<Option<OutboxRecord>, OutboxError> {
        let now = Utc::now();
        let state = self.inner.lock().unwrap();
        Ok(state
            .rows
            .iter()
            .filter(|r| r.domain == domain && r.delivered_at.is_none() && r.next_attempt_at <= now)
            .min_by_key(|r| r.id)
            .cloned())
    }

    async fn mark_delivered(&self, id: i64) -> Result<(), OutboxError> {
        let mut state = self.inner.lock().unwrap();
        if let Some(row) = state.rows.iter_mut().find(|r| r.id == id) {
            if row.delivered_at.is_none() {
                row.delivered_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn record_failure(
        &self,
        id: i64,
        error: &str,
        retry_at: DateTime<Utc>,
    ) -> Result<(), OutboxError> {
        let mut state = self.inner.lock().unwrap();
        if let Some(row) = state.rows.iter_mut().find(|r| r.id == id) {
            row.attempts += 1;
            row.last_error = Some(error.to_owned());
            row.next_attempt_at = retry_at;
        }
        Ok(())
    }
}

/// Process-local domain lock.
#[derive(Clone, Default)]
pub struct MemoryDomainLock {
    held: Arc<Mutex<HashSet<BusinessDomain>>>,
}

impl MemoryDomainLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, domain: BusinessDomain) -> bool {
        self.held.lock().unwrap().contains(&domain)
    }
}

#[async_trait]
impl DomainLock for MemoryDomainLock {
    async fn try_acquire(&self, domain: BusinessDomain) -> Result<bool, OutboxError> {
        Ok(self.held.lock().unwrap().insert(domain))
    }

    async fn release(&self, domain: BusinessDomain) -> Result<(), OutboxError> {
        self.held.lock().unwrap().remove(&domain);
        Ok(())
    }
}
