//! Per-domain background delivery.
//!
//! State machine per cycle: Idle → Claiming (take the domain lock, back off
//! if held elsewhere) → Delivering (strictly oldest-first; a failure halts
//! the cycle so later rows never overtake a stuck one) → release → Idle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

use atrium_domain::event::{BusinessDomain, EventPayload};

use crate::record::OutboxRecord;
use crate::registry::HandlerRegistry;
use crate::retry::RetryPolicy;
use crate::signal::OutboxSignal;
use crate::store::{DomainLock, OutboxError, OutboxStore};

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Timer fallback between cycles, recovering from missed notifications.
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Result of one claim→deliver→release cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another instance holds the domain lock; nothing was attempted.
    LockUnavailable,
    /// Every due row was delivered.
    Drained { delivered: usize },
    /// A delivery failed; the blocked row and everything behind it stay
    /// pending until the next wake.
    Halted { delivered: usize, blocked: i64 },
}

/// Background delivery worker for a single business domain.
pub struct OutboxDispatcher<S, L> {
    domain: BusinessDomain,
    store: S,
    lock: L,
    registry: Arc<HandlerRegistry>,
    wake: Arc<Notify>,
    config: DispatcherConfig,
}

impl<S, L> OutboxDispatcher<S, L>
where
    S: OutboxStore,
    L: DomainLock,
{
    pub fn new(
        domain: BusinessDomain,
        store: S,
        lock: L,
        registry: Arc<HandlerRegistry>,
        wake: Arc<Notify>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            domain,
            store,
            lock,
            registry,
            wake,
            config,
        }
    }

    /// Run until the shutdown channel flips. Wakes on notification or on the
    /// poll timer, whichever comes first.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = self.wake.notified() => {}
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
            match self.run_cycle().await {
                Ok(outcome) => {
                    tracing::debug!(domain = %self.domain, ?outcome, "outbox cycle finished");
                }
                Err(e) => {
                    tracing::error!(domain = %self.domain, error = %e, "outbox cycle failed");
                }
            }
        }
    }

    /// One claim→deliver→release cycle. Public so tests and manual drains
    /// can drive delivery without the background loop.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, OutboxError> {
        if !self.lock.try_acquire(self.domain).await? {
            return Ok(CycleOutcome::LockUnavailable);
        }
        let outcome = self.deliver_until_blocked().await;
        // The lock is released on every path, including storage errors, so a
        // failed cycle cannot park the domain.
        if let Err(e) = self.lock.release(self.domain).await {
            tracing::warn!(domain = %self.domain, error = %e, "failed to release domain lock");
        }
        outcome
    }

    async fn deliver_until_blocked(&self) -> Result<CycleOutcome, OutboxError> {
        let mut delivered = 0;
        loop {
            let Some(record) = self.store.next_pending(self.domain).await? else {
                return Ok(CycleOutcome::Drained { delivered });
            };
            match self.deliver(&record).await {
                Ok(()) => {
                    self.store.mark_delivered(record.id).await?;
                    delivered += 1;
                }
                Err(err) => {
                    let attempts = record.attempts + 1;
                    let delay = self.config.retry.next_delay(attempts);
                    let retry_at = chrono::Utc::now()
                        + chrono::Duration::from_std(delay)
                            .unwrap_or_else(|_| chrono::Duration::seconds(300));
                    self.store
                        .record_failure(record.id, &format!("{err:#}"), retry_at)
                        .await?;
                    if attempts >= self.config.retry.stuck_threshold {
                        tracing::error!(
                            domain = %self.domain,
                            id = record.id,
                            attempts,
                            error = %err,
                            "outbox row stuck past threshold, still retrying"
                        );
                    } else {
                        tracing::warn!(
                            domain = %self.domain,
                            id = record.id,
                            attempts,
                            error = %err,
                            "outbox delivery failed, will retry"
                        );
                    }
                    return Ok(CycleOutcome::Halted {
                        delivered,
                        blocked: record.id,
                    });
                }
            }
        }
    }

    async fn deliver(&self, record: &OutboxRecord) -> Result<(), anyhow::Error> {
        let handler = self
            .registry
            .get(record.domain, record.kind)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "no handler registered for ({}, {:?})",
                    record.domain,
                    record.kind
                )
            })?;
        let payload: EventPayload = serde_json::from_value(record.content.clone())
            .map_err(|e| anyhow::anyhow!("decode outbox payload: {e}"))?;
        handler(payload).await
    }
}

/// One spawned dispatcher per business domain, sharing a shutdown channel.
pub struct DispatcherGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl DispatcherGroup {
    pub fn spawn<S, L>(
        store: &S,
        lock: &L,
        registry: Arc<HandlerRegistry>,
        signal: &OutboxSignal,
        config: DispatcherConfig,
    ) -> Self
    where
        S: OutboxStore + Clone + 'static,
        L: DomainLock + Clone + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut joins = Vec::with_capacity(BusinessDomain::ALL.len());
        for domain in BusinessDomain::ALL {
            let dispatcher = OutboxDispatcher::new(
                domain,
                store.clone(),
                lock.clone(),
                Arc::clone(&registry),
                signal.wake_handle(domain),
                config.clone(),
            );
            let rx = shutdown_rx.clone();
            joins.push(tokio::spawn(dispatcher.run(rx)));
        }
        Self { shutdown_tx, joins }
    }

    /// Ask every dispatcher to stop after its current cycle.
    pub fn request_shutdown(&self) {
        // ignore send error: receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            let _ = join.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use uuid::Uuid;

    use atrium_domain::event::EventKind;

    use super::*;
    use crate::memory::{MemoryDomainLock, MemoryOutboxStore};
    use crate::registry::{HandlerEntry, handler};

    fn test_config() -> DispatcherConfig {
        DispatcherConfig {
            poll_interval: Duration::from_millis(10),
            retry: RetryPolicy::immediate(),
        }
    }

    fn dispatcher(
        domain: BusinessDomain,
        store: &MemoryOutboxStore,
        lock: &MemoryDomainLock,
        registry: HandlerRegistry,
    ) -> OutboxDispatcher<MemoryOutboxStore, MemoryDomainLock> {
        OutboxDispatcher::new(
            domain,
            store.clone(),
            lock.clone(),
            Arc::new(registry),
            Arc::new(Notify::new()),
            test_config(),
        )
    }

    fn app_deleted() -> EventPayload {
        EventPayload::AppDeleted {
            app_id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
        }
    }

    fn app_updated(name: &str) -> EventPayload {
        EventPayload::AppUpdated {
            app_id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: name.to_owned(),
        }
    }

    /// Registry whose App handlers record every payload they see.
    fn recording_registry(seen: Arc<Mutex<Vec<EventPayload>>>) -> HandlerRegistry {
        let record = move |payload: EventPayload| {
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().unwrap().push(payload);
                Ok(())
            }
        };
        HandlerRegistry::from_entries([
            HandlerEntry::new(
                BusinessDomain::App,
                EventKind::AppDeleted,
                handler(record.clone()),
            ),
            HandlerEntry::new(BusinessDomain::App, EventKind::AppUpdated, handler(record)),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn should_deliver_in_enqueue_order_within_a_domain() {
        let store = MemoryOutboxStore::new();
        let lock = MemoryDomainLock::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let e1 = app_deleted();
        let e2 = app_updated("renamed");
        store.enqueue(&e1);
        store.enqueue(&e2);

        let d = dispatcher(
            BusinessDomain::App,
            &store,
            &lock,
            recording_registry(Arc::clone(&seen)),
        );
        let outcome = d.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Drained { delivered: 2 });
        assert_eq!(*seen.lock().unwrap(), vec![e1, e2]);
        assert!(
            store
                .records()
                .iter()
                .all(|r| r.status() == crate::record::OutboxStatus::Delivered)
        );
    }

    #[tokio::test]
    async fn should_halt_on_failure_without_skipping_later_rows() {
        let store = MemoryOutboxStore::new();
        let lock = MemoryDomainLock::new();

        let blocked = store.enqueue(&app_deleted());
        store.enqueue(&app_updated("after"));

        let registry = HandlerRegistry::from_entries([
            HandlerEntry::new(
                BusinessDomain::App,
                EventKind::AppDeleted,
                handler(|_| async { Err(anyhow::anyhow!("downstream unavailable")) }),
            ),
            HandlerEntry::new(
                BusinessDomain::App,
                EventKind::AppUpdated,
                handler(|_| async { panic!("must not run ahead of the blocked row") }),
            ),
        ])
        .unwrap();

        let d = dispatcher(BusinessDomain::App, &store, &lock, registry);
        let outcome = d.run_cycle().await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Halted {
                delivered: 0,
                blocked,
            }
        );
        let row = store.record(blocked).unwrap();
        assert_eq!(row.attempts, 1);
        assert!(row.last_error.unwrap().contains("downstream unavailable"));
    }

    #[tokio::test]
    async fn should_retry_failed_row_until_it_succeeds() {
        let store = MemoryOutboxStore::new();
        let lock = MemoryDomainLock::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let id = store.enqueue(&app_deleted());
        store.enqueue(&app_updated("tail"));

        let calls_in_handler = Arc::clone(&calls);
        let registry = HandlerRegistry::from_entries([
            HandlerEntry::new(
                BusinessDomain::App,
                EventKind::AppDeleted,
                handler(move |_| {
                    let calls = Arc::clone(&calls_in_handler);
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err(anyhow::anyhow!("first attempt fails"))
                        } else {
                            Ok(())
                        }
                    }
                }),
            ),
            HandlerEntry::new(
                BusinessDomain::App,
                EventKind::AppUpdated,
                handler(|_| async { Ok(()) }),
            ),
        ])
        .unwrap();

        let d = dispatcher(BusinessDomain::App, &store, &lock, registry);

        let first = d.run_cycle().await.unwrap();
        assert_eq!(
            first,
            CycleOutcome::Halted {
                delivered: 0,
                blocked: id,
            }
        );
        assert_eq!(
            store.record(id).unwrap().status(),
            crate::record::OutboxStatus::Pending
        );

        let second = d.run_cycle().await.unwrap();
        assert_eq!(second, CycleOutcome::Drained { delivered: 2 });
        assert_eq!(
            store.record(id).unwrap().status(),
            crate::record::OutboxStatus::Delivered
        );
        // Retry re-used the same row; nothing was duplicated.
        assert_eq!(store.records().len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn should_back_off_when_lock_held_elsewhere() {
        let store = MemoryOutboxStore::new();
        let lock = MemoryDomainLock::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        store.enqueue(&app_deleted());

        // Simulate another replica holding the domain.
        assert!(lock.try_acquire(BusinessDomain::App).await.unwrap());

        let d = dispatcher(
            BusinessDomain::App,
            &store,
            &lock,
            recording_registry(Arc::clone(&seen)),
        );
        assert_eq!(d.run_cycle().await.unwrap(), CycleOutcome::LockUnavailable);
        assert!(seen.lock().unwrap().is_empty());

        lock.release(BusinessDomain::App).await.unwrap();
        assert_eq!(
            d.run_cycle().await.unwrap(),
            CycleOutcome::Drained { delivered: 1 }
        );
    }

    #[tokio::test]
    async fn should_release_lock_after_every_cycle() {
        let store = MemoryOutboxStore::new();
        let lock = MemoryDomainLock::new();

        // Failing handler: the cycle halts, but the lock must still be freed.
        store.enqueue(&app_deleted());
        let registry = HandlerRegistry::from_entries([HandlerEntry::new(
            BusinessDomain::App,
            EventKind::AppDeleted,
            handler(|_| async { Err(anyhow::anyhow!("nope")) }),
        )])
        .unwrap();

        let d = dispatcher(BusinessDomain::App, &store, &lock, registry);
        d.run_cycle().await.unwrap();
        assert!(!lock.is_held(BusinessDomain::App));
    }

    #[tokio::test]
    async fn should_not_redeliver_already_delivered_rows() {
        let store = MemoryOutboxStore::new();
        let lock = MemoryDomainLock::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        store.enqueue(&app_deleted());

        let d = dispatcher(
            BusinessDomain::App,
            &store,
            &lock,
            recording_registry(Arc::clone(&seen)),
        );
        assert_eq!(
            d.run_cycle().await.unwrap(),
            CycleOutcome::Drained { delivered: 1 }
        );
        assert_eq!(
            d.run_cycle().await.unwrap(),
            CycleOutcome::Drained { delivered: 0 }
        );
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_halt_when_no_handler_is_registered() {
        let store = MemoryOutboxStore::new();
        let lock = MemoryDomainLock::new();
        let id = store.enqueue(&app_deleted());

        let d = dispatcher(
            BusinessDomain::App,
            &store,
            &lock,
            HandlerRegistry::from_entries([]).unwrap(),
        );
        assert_eq!(
            d.run_cycle().await.unwrap(),
            CycleOutcome::Halted {
                delivered: 0,
                blocked: id,
            }
        );
        let row = store.record(id).unwrap();
        assert!(row.last_error.unwrap().contains("no handler registered"));
    }

    #[tokio::test]
    async fn should_deliver_domains_independently() {
        let store = MemoryOutboxStore::new();
        let lock = MemoryDomainLock::new();
        store.enqueue(&app_deleted());
        store.enqueue(&EventPayload::GroupDeleted {
            group_id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
        });

        // App deliveries are broken; Group must drain regardless.
        let app_registry = HandlerRegistry::from_entries([HandlerEntry::new(
            BusinessDomain::App,
            EventKind::AppDeleted,
            handler(|_| async { Err(anyhow::anyhow!("broken")) }),
        )])
        .unwrap();
        let group_registry = HandlerRegistry::from_entries([HandlerEntry::new(
            BusinessDomain::Group,
            EventKind::GroupDeleted,
            handler(|_| async { Ok(()) }),
        )])
        .unwrap();

        let app = dispatcher(BusinessDomain::App, &store, &lock, app_registry);
        let group = dispatcher(BusinessDomain::Group, &store, &lock, group_registry);

        assert!(matches!(
            app.run_cycle().await.unwrap(),
            CycleOutcome::Halted { .. }
        ));
        assert_eq!(
            group.run_cycle().await.unwrap(),
            CycleOutcome::Drained { delivered: 1 }
        );
    }

    #[tokio::test]
    async fn should_respect_backoff_before_retrying() {
        let store = MemoryOutboxStore::new();
        let lock = MemoryDomainLock::new();
        let id = store.enqueue(&app_deleted());

        let registry = HandlerRegistry::from_entries([HandlerEntry::new(
            BusinessDomain::App,
            EventKind::AppDeleted,
            handler(|_| async { Err(anyhow::anyhow!("still failing")) }),
        )])
        .unwrap();

        // Real backoff (2s base): after the failure the row is not yet due,
        // so an immediate second cycle finds nothing to do.
        let d = OutboxDispatcher::new(
            BusinessDomain::App,
            store.clone(),
            lock.clone(),
            Arc::new(registry),
            Arc::new(Notify::new()),
            DispatcherConfig::default(),
        );
        assert!(matches!(
            d.run_cycle().await.unwrap(),
            CycleOutcome::Halted { .. }
        ));
        assert_eq!(
            d.run_cycle().await.unwrap(),
            CycleOutcome::Drained { delivered: 0 }
        );
        assert_eq!(
            store.record(id).unwrap().status(),
            crate::record::OutboxStatus::Pending
        );
    }

    #[tokio::test]
    async fn should_deliver_after_notify_in_background_run() {
        let store = MemoryOutboxStore::new();
        let lock = MemoryDomainLock::new();
        let signal = OutboxSignal::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let group = DispatcherGroup::spawn(
            &store,
            &lock,
            Arc::new(recording_registry(Arc::clone(&seen))),
            &signal,
            test_config(),
        );

        store.enqueue(&app_deleted());
        signal.notify(BusinessDomain::App);

        // Wait for the background dispatcher to pick the row up.
        for _ in 0..100 {
            if !seen.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(seen.lock().unwrap().len(), 1);

        group.shutdown_and_join().await;
    }
}
