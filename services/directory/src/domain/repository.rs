#![allow(async_fn_in_trait)]

use async_trait::async_trait;
use uuid::Uuid;

use atrium_domain::cascade::{CascadePlan, ManagerRecord, UserMemberships};
use atrium_domain::event::EventPayload;
use atrium_domain::path::DeptPath;

use crate::domain::types::{App, Contactor, Department, Group, OrgAppPermission};
use crate::error::DirectoryError;

/// Repository for application accounts.
///
/// Every `*_with_outbox` method runs its writes and the outbox inserts in a
/// single transaction; if anything fails the whole unit rolls back, so an
/// outbox row never exists without its paired state change.
pub trait AppRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<App>, DirectoryError>;

    /// Fast pre-check for register. Uniqueness is re-validated inside the
    /// register transaction under a row lock; this only avoids opening a
    /// transaction for obviously doomed requests.
    async fn name_taken(&self, org_id: Uuid, name: &str) -> Result<bool, DirectoryError>;

    /// Insert the app and its outbox events atomically. Returns
    /// `DuplicateName` when the in-transaction re-check finds the name taken.
    async fn register_with_outbox(
        &self,
        app: &App,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;

    async fn rename_with_outbox(
        &self,
        id: Uuid,
        name: &str,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;

    async fn delete_with_outbox(
        &self,
        id: Uuid,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;
}

/// Repository for the department tree and its cascade.
pub trait DepartmentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Department>, DirectoryError>;

    /// Whether a sibling with this name already exists under `parent_id`.
    async fn child_name_taken(&self, parent_id: Uuid, name: &str)
    -> Result<bool, DirectoryError>;

    /// Insert the department and its outbox events atomically, re-checking
    /// sibling-name uniqueness under a row lock.
    async fn create_with_outbox(
        &self,
        department: &Department,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;

    async fn rename_with_outbox(
        &self,
        id: Uuid,
        name: &str,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;

    /// Add a user to a department and ensure the user↔organization relation
    /// exists, atomically with the outbox events.
    async fn assign_user_with_outbox(
        &self,
        department_id: Uuid,
        user_id: Uuid,
        org_id: Uuid,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;

    /// Direct children of a department, for tree listings.
    async fn children(&self, id: Uuid) -> Result<Vec<Department>, DirectoryError>;

    /// The node at `path` plus all of its descendants.
    async fn subtree(&self, path: &DeptPath) -> Result<Vec<Department>, DirectoryError>;

    /// Membership snapshots of every user with at least one department
    /// inside the subtree at `path`. Each snapshot carries the user's full
    /// path list, including departments outside the subtree.
    async fn memberships_intersecting(
        &self,
        path: &DeptPath,
    ) -> Result<Vec<UserMemberships>, DirectoryError>;

    /// All manager assignments within an organization.
    async fn managers_for_org(&self, org_id: Uuid) -> Result<Vec<ManagerRecord>, DirectoryError>;

    /// Execute a computed cascade in one transaction: relation deletes,
    /// sentinel relocations, organization detachments, department-row
    /// deletes, manager-assignment deletes, and the outbox inserts.
    /// Nothing is committed if any step fails.
    async fn execute_cascade(
        &self,
        org_id: Uuid,
        plan: &CascadePlan,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;
}

/// Repository for user groups.
pub trait GroupRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, DirectoryError>;

    async fn name_taken(&self, org_id: Uuid, name: &str) -> Result<bool, DirectoryError>;

    async fn create_with_outbox(
        &self,
        group: &Group,
        member_ids: &[Uuid],
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;

    async fn rename_with_outbox(
        &self,
        id: Uuid,
        name: &str,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;

    /// Delete the group and its membership rows in one transaction.
    async fn delete_with_outbox(
        &self,
        id: Uuid,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;
}

/// Repository for contactor lists.
pub trait ContactorRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contactor>, DirectoryError>;

    async fn name_taken(&self, org_id: Uuid, name: &str) -> Result<bool, DirectoryError>;

    async fn create_with_outbox(
        &self,
        contactor: &Contactor,
        member_ids: &[Uuid],
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;

    async fn rename_with_outbox(
        &self,
        id: Uuid,
        name: &str,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;

    async fn delete_with_outbox(
        &self,
        id: Uuid,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;
}

/// Repository for org-scoped application permissions.
pub trait OrgPermissionRepository: Send + Sync {
    async fn find(
        &self,
        org_id: Uuid,
        app_id: Uuid,
    ) -> Result<Option<OrgAppPermission>, DirectoryError>;

    async fn grant_with_outbox(
        &self,
        grant: &OrgAppPermission,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;

    async fn revoke_with_outbox(
        &self,
        org_id: Uuid,
        app_id: Uuid,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError>;
}

/// Repository backing asynchronous manager-quota recomputation.
pub trait QuotaRepository: Send + Sync {
    /// Paths of the departments the manager still manages within the org.
    fn managed_paths(
        &self,
        manager_id: Uuid,
        org_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<DeptPath>, DirectoryError>> + Send;

    /// Summed `space_quota` of every distinct user under any of the given
    /// subtrees.
    fn sum_user_quota_under(
        &self,
        paths: &[DeptPath],
    ) -> impl std::future::Future<Output = Result<i64, DirectoryError>> + Send;

    /// Whether the user's only remaining department membership is the
    /// unassigned sentinel.
    fn is_unassigned(
        &self,
        user_id: Uuid,
    ) -> impl std::future::Future<Output = Result<bool, DirectoryError>> + Send;

    fn upsert_quota(
        &self,
        manager_id: Uuid,
        org_id: Uuid,
        quota_bytes: i64,
    ) -> impl std::future::Future<Output = Result<(), DirectoryError>> + Send;

    fn delete_quota(
        &self,
        manager_id: Uuid,
        org_id: Uuid,
    ) -> impl std::future::Future<Output = Result<(), DirectoryError>> + Send;
}

/// Message-bus port. Invoked only from outbox handlers, never inline from
/// business logic, so publication always rides the at-least-once guarantee.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    async fn publish(&self, topic: &str, payload: &serde_json::Value)
    -> Result<(), anyhow::Error>;
}

/// Audit sink port, mediated by the outbox exactly like the broker.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(
        &self,
        actor_id: Uuid,
        operation: &str,
        subject: &str,
    ) -> Result<(), anyhow::Error>;
}
