use chrono::Utc;
use uuid::Uuid;

use atrium_domain::cascade::CascadePlan;
use atrium_domain::event::{BusinessDomain, EventPayload};
use atrium_domain::path::DeptPath;
use atrium_outbox::OutboxSignal;

use crate::domain::repository::DepartmentRepository;
use crate::domain::types::{Department, validate_name};
use crate::error::DirectoryError;

// ── CreateOrganization ───────────────────────────────────────────────────────

pub struct CreateOrganizationInput {
    pub name: String,
    pub actor_id: Uuid,
}

pub struct CreateOrganizationUseCase<R: DepartmentRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: DepartmentRepository> CreateOrganizationUseCase<R> {
    pub async fn execute(
        &self,
        input: CreateOrganizationInput,
    ) -> Result<Department, DirectoryError> {
        if !validate_name(&input.name) {
            return Err(DirectoryError::InvalidName);
        }

        // An organization is the root node of its own tree: path is the
        // node's single id and org_id equals the node id.
        let id = Uuid::new_v4();
        let now = Utc::now();
        let department = Department {
            id,
            org_id: id,
            parent_id: None,
            name: input.name,
            path: DeptPath::root(id),
            manager_id: None,
            status: 0,
            is_root: true,
            created_at: now,
            updated_at: now,
        };

        let events = [
            EventPayload::DepartmentCreated {
                department_id: id,
                org_id: id,
                path: department.path.to_string(),
                name: department.name.clone(),
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::Department,
                actor_id: input.actor_id,
                operation: "department.create".to_owned(),
                subject: department.path.to_string(),
            },
        ];
        self.repo.create_with_outbox(&department, &events).await?;
        self.signal.notify(BusinessDomain::Department);
        Ok(department)
    }
}

// ── CreateDepartment ─────────────────────────────────────────────────────────

pub struct CreateDepartmentInput {
    pub parent_id: Uuid,
    pub name: String,
    pub manager_id: Option<Uuid>,
    pub actor_id: Uuid,
}

pub struct CreateDepartmentUseCase<R: DepartmentRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: DepartmentRepository> CreateDepartmentUseCase<R> {
    pub async fn execute(
        &self,
        input: CreateDepartmentInput,
    ) -> Result<Department, DirectoryError> {
        // 1. Validate name
        if !validate_name(&input.name) {
            return Err(DirectoryError::InvalidName);
        }

        // 2. Parent must exist; the child's path extends the parent's
        let parent = self
            .repo
            .find_by_id(input.parent_id)
            .await?
            .ok_or(DirectoryError::DepartmentNotFound)?;

        // 3. Fast sibling-name check; re-validated inside the transaction
        if self.repo.child_name_taken(parent.id, &input.name).await? {
            return Err(DirectoryError::DuplicateName);
        }

        // 4. Build node + events, write atomically
        let id = Uuid::new_v4();
        let now = Utc::now();
        let department = Department {
            id,
            org_id: parent.org_id,
            parent_id: Some(parent.id),
            name: input.name,
            path: parent.path.child(id),
            manager_id: input.manager_id,
            status: 0,
            is_root: false,
            created_at: now,
            updated_at: now,
        };
        let events = [
            EventPayload::DepartmentCreated {
                department_id: id,
                org_id: department.org_id,
                path: department.path.to_string(),
                name: department.name.clone(),
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::Department,
                actor_id: input.actor_id,
                operation: "department.create".to_owned(),
                subject: department.path.to_string(),
            },
        ];
        self.repo.create_with_outbox(&department, &events).await?;

        // 5. Wake the dispatcher after commit
        self.signal.notify(BusinessDomain::Department);
        Ok(department)
    }
}

// ── GetDepartment ────────────────────────────────────────────────────────────

pub struct GetDepartmentUseCase<R: DepartmentRepository> {
    pub repo: R,
}

impl<R: DepartmentRepository> GetDepartmentUseCase<R> {
    pub async fn execute(&self, department_id: Uuid) -> Result<Department, DirectoryError> {
        self.repo
            .find_by_id(department_id)
            .await?
            .ok_or(DirectoryError::DepartmentNotFound)
    }
}

// ── ListDepartmentChildren ───────────────────────────────────────────────────

pub struct ListDepartmentChildrenUseCase<R: DepartmentRepository> {
    pub repo: R,
}

impl<R: DepartmentRepository> ListDepartmentChildrenUseCase<R> {
    pub async fn execute(&self, department_id: Uuid) -> Result<Vec<Department>, DirectoryError> {
        self.repo
            .find_by_id(department_id)
            .await?
            .ok_or(DirectoryError::DepartmentNotFound)?;
        self.repo.children(department_id).await
    }
}

// ── RenameDepartment ─────────────────────────────────────────────────────────

pub struct RenameDepartmentInput {
    pub name: String,
    pub actor_id: Uuid,
}

pub struct RenameDepartmentUseCase<R: DepartmentRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: DepartmentRepository> RenameDepartmentUseCase<R> {
    pub async fn execute(
        &self,
        department_id: Uuid,
        input: RenameDepartmentInput,
    ) -> Result<(), DirectoryError> {
        if !validate_name(&input.name) {
            return Err(DirectoryError::InvalidName);
        }
        let department = self
            .repo
            .find_by_id(department_id)
            .await?
            .ok_or(DirectoryError::DepartmentNotFound)?;

        let events = [
            EventPayload::DepartmentRenamed {
                department_id,
                org_id: department.org_id,
                name: input.name.clone(),
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::Department,
                actor_id: input.actor_id,
                operation: "department.rename".to_owned(),
                subject: department.path.to_string(),
            },
        ];
        self.repo
            .rename_with_outbox(department_id, &input.name, &events)
            .await?;
        self.signal.notify(BusinessDomain::Department);
        Ok(())
    }
}

// ── AssignUser ───────────────────────────────────────────────────────────────

pub struct AssignUserInput {
    pub user_id: Uuid,
    pub actor_id: Uuid,
}

pub struct AssignUserUseCase<R: DepartmentRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: DepartmentRepository> AssignUserUseCase<R> {
    pub async fn execute(
        &self,
        department_id: Uuid,
        input: AssignUserInput,
    ) -> Result<(), DirectoryError> {
        let department = self
            .repo
            .find_by_id(department_id)
            .await?
            .ok_or(DirectoryError::DepartmentNotFound)?;

        let events = [
            EventPayload::DepartmentUserAssigned {
                department_id,
                user_id: input.user_id,
                org_id: department.org_id,
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::Department,
                actor_id: input.actor_id,
                operation: "department.assign_user".to_owned(),
                subject: input.user_id.to_string(),
            },
        ];
        self.repo
            .assign_user_with_outbox(department_id, input.user_id, department.org_id, &events)
            .await?;
        self.signal.notify(BusinessDomain::Department);
        Ok(())
    }
}

// ── DeleteDepartment ─────────────────────────────────────────────────────────

pub struct DeleteDepartmentUseCase<R: DepartmentRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: DepartmentRepository> DeleteDepartmentUseCase<R> {
    /// Delete a department subtree with full cascade.
    ///
    /// The plan is computed from read-only queries before the delete
    /// transaction opens, consumed inside it, and discarded after commit. A
    /// failure in any read aborts before any write; a failure in any write
    /// (including the outbox inserts) rolls the whole cascade back.
    pub async fn execute(&self, department_id: Uuid, actor_id: Uuid) -> Result<(), DirectoryError> {
        // 1. Target must exist and must not be an organization root
        let department = self
            .repo
            .find_by_id(department_id)
            .await?
            .ok_or(DirectoryError::DepartmentNotFound)?;
        if department.is_root {
            return Err(DirectoryError::CannotDeleteRoot);
        }

        // 2. Snapshot the subtree, affected users, and manager assignments
        let subtree = self.repo.subtree(&department.path).await?;
        let users = self.repo.memberships_intersecting(&department.path).await?;
        let managers = self.repo.managers_for_org(department.org_id).await?;

        // 3. Decide relocations, detachments, and quota targets
        let subtree_ids: Vec<Uuid> = subtree.iter().map(|d| d.id).collect();
        let plan = CascadePlan::compute(&department.path, &subtree_ids, &users, &managers);

        // 4. One deleted event per node, one managers-changed event for the
        //    async quota recomputation, one audit event
        let org_id = department.org_id;
        let mut events: Vec<EventPayload> = plan
            .affected_department_ids
            .iter()
            .map(|&id| EventPayload::DepartmentDeleted {
                department_id: id,
                org_id,
            })
            .collect();
        events.push(EventPayload::DepartmentManagersChanged {
            org_id,
            manager_ids: plan.affected_manager_ids.clone(),
        });
        events.push(EventPayload::AuditRecorded {
            domain: BusinessDomain::Department,
            actor_id,
            operation: "department.delete".to_owned(),
            subject: department.path.to_string(),
        });

        // 5. Execute the cascade and the outbox inserts in one transaction
        self.repo.execute_cascade(org_id, &plan, &events).await?;

        // 6. Wake the dispatcher after commit
        self.signal.notify(BusinessDomain::Department);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use atrium_domain::cascade::{ManagerRecord, UserMemberships};

    struct MockDeptRepo {
        department: Option<Department>,
        child_taken: bool,
    }

    impl DepartmentRepository for MockDeptRepo {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Department>, DirectoryError> {
            Ok(self.department.clone())
        }
        async fn child_name_taken(
            &self,
            _parent_id: Uuid,
            _name: &str,
        ) -> Result<bool, DirectoryError> {
            Ok(self.child_taken)
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
            Ok(vec![])
        }
        async fn memberships_intersecting(
            &self,
            _path: &DeptPath,
        ) -> Result<Vec<UserMemberships>, DirectoryError> {
            Ok(vec![])
        }
        async fn managers_for_org(
            &self,
            _org_id: Uuid,
        ) -> Result<Vec<ManagerRecord>, DirectoryError> {
            Ok(vec![])
        }
        async fn execute_cascade(
            &self,
            _org_id: Uuid,
            _plan: &CascadePlan,
            _events: &[EventPayload],
        ) -> Result<(), DirectoryError> {
            Ok(())
        }
    }

    fn root_department() -> Department {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Department {
            id,
            org_id: id,
            parent_id: None,
            name: "acme".into(),
            path: DeptPath::root(id),
            manager_id: None,
            status: 0,
            is_root: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn should_reject_invalid_department_name() {
        let uc = CreateDepartmentUseCase {
            repo: MockDeptRepo {
                department: Some(root_department()),
                child_taken: false,
            },
            signal: OutboxSignal::new(),
        };
        let result = uc
            .execute(CreateDepartmentInput {
                parent_id: Uuid::new_v4(),
                name: "".into(),
                manager_id: None,
                actor_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(result, Err(DirectoryError::InvalidName)));
    }

    #[tokio::test]
    async fn should_require_existing_parent() {
        let uc = CreateDepartmentUseCase {
            repo: MockDeptRepo {
                department: None,
                child_taken: false,
            },
            signal: OutboxSignal::new(),
        };
        let result = uc
            .execute(CreateDepartmentInput {
                parent_id: Uuid::new_v4(),
                name: "ops".into(),
                manager_id: None,
                actor_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(result, Err(DirectoryError::DepartmentNotFound)));
    }

    #[tokio::test]
    async fn should_extend_parent_path_when_creating_child() {
        let parent = root_department();
        let uc = CreateDepartmentUseCase {
            repo: MockDeptRepo {
                department: Some(parent.clone()),
                child_taken: false,
            },
            signal: OutboxSignal::new(),
        };
        let created = uc
            .execute(CreateDepartmentInput {
                parent_id: parent.id,
                name: "ops".into(),
                manager_id: None,
                actor_id: Uuid::new_v4(),
            })
            .await
            .unwrap();

        assert_eq!(created.org_id, parent.org_id);
        assert_eq!(created.path, parent.path.child(created.id));
        assert!(!created.is_root);
    }

    #[tokio::test]
    async fn should_reject_duplicate_sibling_name() {
        let uc = CreateDepartmentUseCase {
            repo: MockDeptRepo {
                department: Some(root_department()),
                child_taken: true,
            },
            signal: OutboxSignal::new(),
        };
        let result = uc
            .execute(CreateDepartmentInput {
                parent_id: Uuid::new_v4(),
                name: "ops".into(),
                manager_id: None,
                actor_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(result, Err(DirectoryError::DuplicateName)));
    }

    #[tokio::test]
    async fn should_refuse_to_delete_organization_root() {
        let root = root_department();
        let uc = DeleteDepartmentUseCase {
            repo: MockDeptRepo {
                department: Some(root.clone()),
                child_taken: false,
            },
            signal: OutboxSignal::new(),
        };
        let result = uc.execute(root.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(DirectoryError::CannotDeleteRoot)));
    }
}
