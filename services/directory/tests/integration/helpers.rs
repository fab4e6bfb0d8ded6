use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use atrium_directory::domain::repository::{
    AppRepository, AuditSink, DepartmentRepository, MessageBroker, QuotaRepository,
};
use atrium_directory::domain::types::{App, Department};
use atrium_directory::error::DirectoryError;
use atrium_domain::cascade::{CascadePlan, ManagerRecord, UserMemberships};
use atrium_domain::event::EventPayload;
use atrium_domain::path::DeptPath;
use atrium_outbox::MemoryOutboxStore;

// ── Broker / audit / quota mocks ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockBroker {
    pub published: Mutex<Vec<(String, serde_json::Value)>>,
}

#[async_trait]
impl MessageBroker for MockBroker {
    async fn publish(
        &self,
        topic: &str,
        payload: &serde_json::Value,
    ) -> Result<(), anyhow::Error> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_owned(), payload.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockAudit {
    pub entries: Mutex<Vec<(Uuid, String, String)>>,
}

#[async_trait]
impl AuditSink for MockAudit {
    async fn record(
        &self,
        actor_id: Uuid,
        operation: &str,
        subject: &str,
    ) -> Result<(), anyhow::Error> {
        self.entries
            .lock()
            .unwrap()
            .push((actor_id, operation.to_owned(), subject.to_owned()));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockQuotaRepo {
    pub recomputed: Arc<Mutex<Vec<Uuid>>>,
}

impl QuotaRepository for MockQuotaRepo {
    async fn managed_paths(
        &self,
        _manager_id: Uuid,
        _org_id: Uuid,
    ) -> Result<Vec<DeptPath>, DirectoryError> {
        Ok(vec![])
    }
    async fn sum_user_quota_under(&self, _paths: &[DeptPath]) -> Result<i64, DirectoryError> {
        Ok(0)
    }
    async fn is_unassigned(&self, _user_id: Uuid) -> Result<bool, DirectoryError> {
        Ok(false)
    }
    async fn upsert_quota(
        &self,
        manager_id: Uuid,
        _org_id: Uuid,
        _quota_bytes: i64,
    ) -> Result<(), DirectoryError> {
        self.recomputed.lock().unwrap().push(manager_id);
        Ok(())
    }
    async fn delete_quota(&self, _manager_id: Uuid, _org_id: Uuid) -> Result<(), DirectoryError> {
        Ok(())
    }
}

// ── App repository writing into an in-memory outbox ──────────────────────────

/// App repository whose `*_with_outbox` methods enqueue into a
/// [`MemoryOutboxStore`], standing in for the transactional insert the
/// database implementation performs.
pub struct OutboxAppRepo {
    pub app: Mutex<Option<App>>,
    pub store: MemoryOutboxStore,
}

impl OutboxAppRepo {
    pub fn new(store: MemoryOutboxStore) -> Self {
        Self {
            app: Mutex::new(None),
            store,
        }
    }
}

impl AppRepository for OutboxAppRepo {
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<App>, DirectoryError> {
        Ok(self.app.lock().unwrap().clone())
    }
    async fn name_taken(&self, _org_id: Uuid, _name: &str) -> Result<bool, DirectoryError> {
        Ok(false)
    }
    async fn register_with_outbox(
        &self,
        app: &App,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        *self.app.lock().unwrap() = Some(app.clone());
        for event in events {
            self.store.enqueue(event);
        }
        Ok(())
    }
    async fn rename_with_outbox(
        &self,
        _id: Uuid,
        name: &str,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        if let Some(app) = self.app.lock().unwrap().as_mut() {
            app.name = name.to_owned();
        }
        for event in events {
            self.store.enqueue(event);
        }
        Ok(())
    }
    async fn delete_with_outbox(
        &self,
        _id: Uuid,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        *self.app.lock().unwrap() = None;
        for event in events {
            self.store.enqueue(event);
        }
        Ok(())
    }
}

// ── Department repository mock with scripted reads ───────────────────────────

#[derive(Default)]
pub struct MockDepartmentRepo {
    pub departments: HashMap<Uuid, Department>,
    pub subtree: Vec<Department>,
    pub memberships: Vec<UserMemberships>,
    pub managers: Vec<ManagerRecord>,
    /// Error injected into the subtree read, to exercise abort-before-write.
    pub fail_subtree_read: bool,
    pub cascades: Mutex<Vec<(Uuid, CascadePlan, Vec<EventPayload>)>>,
}

impl DepartmentRepository for MockDepartmentRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Department>, DirectoryError> {
        Ok(self.departments.get(&id).cloned())
    }
    async fn child_name_taken(
        &self,
        _parent_id: Uuid,
        _name: &str,
    ) -> Result<bool, DirectoryError> {
        Ok(false)
    }
    async fn create_with_outbox(
        &self,
        _department: &Department,
        _events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        Ok(())
    }
    async fn rename_with_outbox(
        &self,
        _id: Uuid,
        _name: &str,
        _events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        Ok(())
    }
    async fn assign_user_with_outbox(
        &self,
        _department_id: Uuid,
        _user_id: Uuid,
        _org_id: Uuid,
        _events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        Ok(())
    }
    async fn children(&self, _id: Uuid) -> Result<Vec<Department>, DirectoryError> {
        Ok(vec![])
    }
    async fn subtree(&self, _path: &DeptPath) -> Result<Vec<Department>, DirectoryError> {
        if self.fail_subtree_read {
            return Err(DirectoryError::Internal(anyhow::anyhow!(
                "subtree read failed"
            )));
        }
        Ok(self.subtree.clone())
    }
    async fn memberships_intersecting(
        &self,
        _path: &DeptPath,
    ) -> Result<Vec<UserMemberships>, DirectoryError> {
        Ok(self.memberships.clone())
    }
    async fn managers_for_org(
        &self,
        _org_id: Uuid,
    ) -> Result<Vec<ManagerRecord>, DirectoryError> {
        Ok(self.managers.clone())
    }
    async fn execute_cascade(
        &self,
        org_id: Uuid,
        plan: &CascadePlan,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        self.cascades
            .lock()
            .unwrap()
            .push((org_id, plan.clone(), events.to_vec()));
        Ok(())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn department(id: Uuid, path: DeptPath, is_root: bool) -> Department {
    let now = Utc::now();
    Department {
        id,
        org_id: path.root_org(),
        parent_id: path.parent().map(|p| p.leaf()),
        name: format!("dept-{id}"),
        path,
        manager_id: None,
        status: 0,
        is_root,
        created_at: now,
        updated_at: now,
    }
}

