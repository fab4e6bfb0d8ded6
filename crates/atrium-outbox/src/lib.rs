//! Transactional-outbox delivery engine.
//!
//! Business modules write outbox rows in the same database transaction as
//! the state change they describe, then ping [`OutboxSignal`] after commit.
//! One [`OutboxDispatcher`] per business domain claims the domain lock,
//! drains pending rows strictly oldest-first through the
//! [`HandlerRegistry`], and retries failed rows with exponential backoff.
//! Delivery is at-least-once; handlers must be idempotent.
//!
//! Storage is behind the [`OutboxStore`] / [`DomainLock`] ports so the
//! engine itself carries no database dependency. `memory` provides
//! in-process implementations for tests and single-node runs.

mod dispatcher;
mod memory;
mod record;
mod registry;
mod retry;
mod signal;
mod store;

pub use dispatcher::{CycleOutcome, DispatcherConfig, DispatcherGroup, OutboxDispatcher};
pub use memory::{MemoryDomainLock, MemoryOutboxStore};
pub use record::{OutboxRecord, OutboxStatus};
pub use registry::{Handler, HandlerEntry, HandlerRegistry, RegistryError, handler};
pub use retry::RetryPolicy;
pub use signal::OutboxSignal;
pub use store::{DomainLock, OutboxError, OutboxStore};
