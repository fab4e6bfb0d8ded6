use chrono::{DateTime, Utc};

use atrium_domain::event::{BusinessDomain, EventKind};

/// Delivery state of an outbox row. There is no terminal failure state: a
/// row that cannot be delivered stays `Pending` and is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxStatus {
    Pending,
    Delivered,
}

/// One durable outbox row.
///
/// A record exists only if the business mutation it describes committed in
/// the same transaction; the enqueue helpers in the service's `infra` layer
/// uphold that by inserting through the caller's transaction handle.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxRecord {
    /// Insertion-ordered within a business domain; delivery follows this order.
    pub id: i64,
    pub domain: BusinessDomain,
    pub kind: EventKind,
    /// Serialized `EventPayload`, captured in full at enqueue time.
    pub content: serde_json::Value,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Earliest time the next delivery attempt may run.
    pub next_attempt_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl OutboxRecord {
    pub fn status(&self) -> OutboxStatus {
        if self.delivered_at.is_some() {
            OutboxStatus::Delivered
        } else {
            OutboxStatus::Pending
        }
    }
}
