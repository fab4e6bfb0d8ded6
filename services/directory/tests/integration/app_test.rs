use std::sync::Arc;

use tokio::sync::Notify;
use uuid::Uuid;

use atrium_directory::events::build_registry;
use atrium_directory::usecase::app::{DeleteAppUseCase, RegisterAppInput, RegisterAppUseCase};
use atrium_domain::event::BusinessDomain;
use atrium_outbox::{
    CycleOutcome, DispatcherConfig, MemoryDomainLock, MemoryOutboxStore, OutboxDispatcher,
    OutboxSignal, OutboxStatus, RetryPolicy,
};

use crate::helpers::{MockAudit, MockBroker, MockQuotaRepo, OutboxAppRepo};

fn app_dispatcher(
    store: &MemoryOutboxStore,
    broker: Arc<MockBroker>,
    audit: Arc<MockAudit>,
) -> OutboxDispatcher<MemoryOutboxStore, MemoryDomainLock> {
    let registry = build_registry(broker, audit, MockQuotaRepo::default()).unwrap();
    OutboxDispatcher::new(
        BusinessDomain::App,
        store.clone(),
        MemoryDomainLock::new(),
        Arc::new(registry),
        Arc::new(Notify::new()),
        DispatcherConfig {
            poll_interval: std::time::Duration::from_millis(10),
            retry: RetryPolicy::immediate(),
        },
    )
}

#[tokio::test]
async fn should_deliver_register_then_delete_in_enqueue_order() {
    let store = MemoryOutboxStore::new();
    let broker = Arc::new(MockBroker::default());
    let audit = Arc::new(MockAudit::default());
    let signal = OutboxSignal::new();
    let org_id = Uuid::new_v4();
    let actor = Uuid::new_v4();

    // Two operations, four outbox rows: registered + audit, deleted + audit.
    let register = RegisterAppUseCase {
        repo: OutboxAppRepo::new(store.clone()),
        signal: signal.clone(),
    };
    let app = register
        .execute(RegisterAppInput {
            org_id,
            name: "crm".into(),
            actor_id: actor,
        })
        .await
        .unwrap();

    let delete = DeleteAppUseCase {
        repo: register.repo,
        signal: signal.clone(),
    };
    delete.execute(app.id, actor).await.unwrap();

    let dispatcher = app_dispatcher(&store, Arc::clone(&broker), Arc::clone(&audit));
    let outcome = dispatcher.run_cycle().await.unwrap();
    assert_eq!(outcome, CycleOutcome::Drained { delivered: 4 });

    // Broker saw the mutations in operation order, never reordered.
    let published = broker.published.lock().unwrap();
    let topics: Vec<&str> = published.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(
        topics,
        vec!["directory.app.registered", "directory.app.deleted"]
    );

    // Both audit events landed, in the same order.
    let entries = audit.entries.lock().unwrap();
    let operations: Vec<&str> = entries.iter().map(|(_, op, _)| op.as_str()).collect();
    assert_eq!(operations, vec!["app.register", "app.delete"]);
}

#[tokio::test]
async fn should_mark_every_row_delivered_after_a_full_cycle() {
    let store = MemoryOutboxStore::new();
    let signal = OutboxSignal::new();

    let register = RegisterAppUseCase {
        repo: OutboxAppRepo::new(store.clone()),
        signal,
    };
    register
        .execute(RegisterAppInput {
            org_id: Uuid::new_v4(),
            name: "crm".into(),
            actor_id: Uuid::new_v4(),
        })
        .await
        .unwrap();

    let dispatcher = app_dispatcher(
        &store,
        Arc::new(MockBroker::default()),
        Arc::new(MockAudit::default()),
    );
    dispatcher.run_cycle().await.unwrap();

    assert!(
        store
            .records()
            .iter()
            .all(|r| r.status() == OutboxStatus::Delivered)
    );

    // A second cycle finds nothing: already-delivered rows are never replayed.
    assert_eq!(
        dispatcher.run_cycle().await.unwrap(),
        CycleOutcome::Drained { delivered: 0 }
    );
}
