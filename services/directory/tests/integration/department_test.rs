use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Notify;
use uuid::Uuid;

use atrium_directory::error::DirectoryError;
use atrium_directory::events::build_registry;
use atrium_directory::usecase::department::DeleteDepartmentUseCase;
use atrium_domain::cascade::{ManagerRecord, UserMemberships};
use atrium_domain::event::{BusinessDomain, EventPayload};
use atrium_domain::path::DeptPath;
use atrium_outbox::{
    CycleOutcome, DispatcherConfig, MemoryDomainLock, MemoryOutboxStore, OutboxDispatcher,
    OutboxSignal, RetryPolicy,
};

use crate::helpers::{MockAudit, MockBroker, MockDepartmentRepo, MockQuotaRepo, department};

fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

// Tree under test: organization R with R/A, R/A/B, R/A/C.
const R: u128 = 1;
const A: u128 = 2;
const B: u128 = 3;
const C: u128 = 4;

fn path_b() -> DeptPath {
    DeptPath::root(id(R)).child(id(A)).child(id(B))
}

fn path_c() -> DeptPath {
    DeptPath::root(id(R)).child(id(A)).child(id(C))
}

fn repo_for_delete_of_b() -> MockDepartmentRepo {
    let dept_b = department(id(B), path_b(), false);
    MockDepartmentRepo {
        departments: HashMap::from([(id(B), dept_b.clone())]),
        subtree: vec![dept_b],
        ..Default::default()
    }
}

#[tokio::test]
async fn should_relocate_only_users_without_remaining_membership() {
    // U1 keeps a sibling membership in R/A/C; U2's only membership is the
    // deleted subtree.
    let mut repo = repo_for_delete_of_b();
    repo.memberships = vec![
        UserMemberships {
            user_id: id(10),
            paths: vec![path_b(), path_c()],
        },
        UserMemberships {
            user_id: id(11),
            paths: vec![path_b()],
        },
    ];

    let uc = DeleteDepartmentUseCase {
        repo,
        signal: OutboxSignal::new(),
    };
    uc.execute(id(B), Uuid::new_v4()).await.unwrap();

    let cascades = uc.repo.cascades.lock().unwrap();
    assert_eq!(cascades.len(), 1);
    let (org_id, plan, _events) = &cascades[0];
    assert_eq!(*org_id, id(R));
    assert_eq!(plan.users_to_unassign, vec![id(11)]);
    assert_eq!(plan.users_to_detach_from_org, vec![id(11)]);
    assert_eq!(plan.affected_department_ids, vec![id(B)]);
}

#[tokio::test]
async fn should_enqueue_one_deleted_event_per_node_then_managers_then_audit() {
    let dept_b = department(id(B), path_b(), false);
    let child_1 = department(id(30), path_b().child(id(30)), false);
    let child_2 = department(id(31), path_b().child(id(31)), false);
    let repo = MockDepartmentRepo {
        departments: HashMap::from([(id(B), dept_b.clone())]),
        subtree: vec![dept_b, child_1, child_2],
        ..Default::default()
    };

    let uc = DeleteDepartmentUseCase {
        repo,
        signal: OutboxSignal::new(),
    };
    uc.execute(id(B), Uuid::new_v4()).await.unwrap();

    let cascades = uc.repo.cascades.lock().unwrap();
    let (_, _, events) = &cascades[0];
    assert_eq!(events.len(), 5);
    let deleted_ids: Vec<Uuid> = events[..3]
        .iter()
        .map(|e| match e {
            EventPayload::DepartmentDeleted { department_id, .. } => *department_id,
            other => panic!("expected DepartmentDeleted, got {other:?}"),
        })
        .collect();
    assert_eq!(deleted_ids, vec![id(B), id(30), id(31)]);
    assert!(matches!(
        events[3],
        EventPayload::DepartmentManagersChanged { .. }
    ));
    assert!(matches!(events[4], EventPayload::AuditRecorded { .. }));
}

#[tokio::test]
async fn should_flag_managers_of_deleted_nodes_and_ancestors() {
    let mut repo = repo_for_delete_of_b();
    repo.managers = vec![
        ManagerRecord {
            manager_id: id(40),
            department_id: id(A),
        },
        ManagerRecord {
            manager_id: id(41),
            department_id: id(R),
        },
        // Sibling manager is out of scope.
        ManagerRecord {
            manager_id: id(42),
            department_id: id(C),
        },
    ];

    let uc = DeleteDepartmentUseCase {
        repo,
        signal: OutboxSignal::new(),
    };
    uc.execute(id(B), Uuid::new_v4()).await.unwrap();

    let cascades = uc.repo.cascades.lock().unwrap();
    let (_, plan, events) = &cascades[0];
    assert_eq!(plan.affected_manager_ids, vec![id(40), id(41)]);
    let managers_event = events
        .iter()
        .find_map(|e| match e {
            EventPayload::DepartmentManagersChanged { manager_ids, .. } => Some(manager_ids),
            _ => None,
        })
        .unwrap();
    assert_eq!(*managers_event, vec![id(40), id(41)]);
}

#[tokio::test]
async fn should_abort_before_any_write_when_a_read_fails() {
    let mut repo = repo_for_delete_of_b();
    repo.fail_subtree_read = true;

    let uc = DeleteDepartmentUseCase {
        repo,
        signal: OutboxSignal::new(),
    };
    let result = uc.execute(id(B), Uuid::new_v4()).await;

    assert!(matches!(result, Err(DirectoryError::Internal(_))));
    assert!(uc.repo.cascades.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_recompute_quotas_when_managers_changed_event_is_dispatched() {
    let store = MemoryOutboxStore::new();
    let quotas = MockQuotaRepo::default();
    let registry = build_registry(
        Arc::new(MockBroker::default()),
        Arc::new(MockAudit::default()),
        quotas.clone(),
    )
    .unwrap();

    let manager = Uuid::new_v4();
    store.enqueue(&EventPayload::DepartmentManagersChanged {
        org_id: id(R),
        manager_ids: vec![manager],
    });

    let dispatcher = OutboxDispatcher::new(
        BusinessDomain::Department,
        store.clone(),
        MemoryDomainLock::new(),
        Arc::new(registry),
        Arc::new(Notify::new()),
        DispatcherConfig {
            poll_interval: std::time::Duration::from_millis(10),
            retry: RetryPolicy::immediate(),
        },
    );
    let outcome = dispatcher.run_cycle().await.unwrap();

    assert_eq!(outcome, CycleOutcome::Drained { delivered: 1 });
    assert_eq!(*quotas.recomputed.lock().unwrap(), vec![manager]);
}
