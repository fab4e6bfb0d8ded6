//! Sea-orm implementation of the department tree repository.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context as _, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::OnConflict,
};
use uuid::Uuid;

use atrium_directory_schema::{department_users, departments, org_managers, user_organizations};
use atrium_domain::cascade::{
    CascadePlan, ManagerRecord, UNASSIGNED_DEPARTMENT_ID, UserMemberships,
};
use atrium_domain::event::EventPayload;
use atrium_domain::path::DeptPath;

use crate::domain::repository::DepartmentRepository;
use crate::domain::types::Department;
use crate::error::DirectoryError;
use crate::infra::outbox::insert_outbox_events;

#[derive(Clone)]
pub struct DbDepartmentRepository {
    pub db: DatabaseConnection,
}

pub(crate) fn department_from_model(
    model: departments::Model,
) -> Result<Department, DirectoryError> {
    let path = DeptPath::parse(&model.path)
        .map_err(|e| anyhow!("corrupt department path {:?}: {e}", model.path))?;
    Ok(Department {
        id: model.id,
        org_id: model.org_id,
        parent_id: model.parent_id,
        name: model.name,
        path,
        manager_id: model.manager_id,
        status: model.status,
        is_root: model.is_root,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn model_from_department(department: &Department) -> departments::ActiveModel {
    departments::ActiveModel {
        id: Set(department.id),
        org_id: Set(department.org_id),
        parent_id: Set(department.parent_id),
        name: Set(department.name.clone()),
        path: Set(department.path.to_string()),
        manager_id: Set(department.manager_id),
        status: Set(department.status),
        is_root: Set(department.is_root),
        created_at: Set(department.created_at),
        updated_at: Set(department.updated_at),
    }
}

/// Subtree filter: the node itself plus everything under it. Paths are
/// UUID chains, so the string prefix is exact at segment boundaries.
fn subtree_condition(path: &DeptPath) -> Condition {
    Condition::any()
        .add(departments::Column::Path.eq(path.as_str()))
        .add(departments::Column::Path.like(format!("{}/%", path.as_str())))
}

impl DepartmentRepository for DbDepartmentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Department>, DirectoryError> {
        let model = departments::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find department by id")?;
        model.map(department_from_model).transpose()
    }

    async fn child_name_taken(
        &self,
        parent_id: Uuid,
        name: &str,
    ) -> Result<bool, DirectoryError> {
        let count = departments::Entity::find()
            .filter(departments::Column::ParentId.eq(parent_id))
            .filter(departments::Column::Name.eq(name))
            .count(&self.db)
            .await
            .context("check sibling department name")?;
        Ok(count > 0)
    }

    async fn create_with_outbox(
        &self,
        department: &Department,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        let department = department.clone();
        let events = events.to_vec();
        self.db
            .transaction::<_, (), DirectoryError>(|txn| {
                Box::pin(async move {
                    // Re-validate sibling-name uniqueness under a row lock:
                    // the pre-check outside the transaction cannot exclude a
                    // concurrent create of the same name.
                    if let Some(parent_id) = department.parent_id {
                        let sibling = departments::Entity::find()
                            .filter(departments::Column::ParentId.eq(parent_id))
                            .filter(departments::Column::Name.eq(department.name.clone()))
                            .lock_exclusive()
                            .one(txn)
                            .await?;
                        if sibling.is_some() {
                            return Err(DirectoryError::DuplicateName);
                        }
                    }
                    model_from_department(&department).insert(txn).await?;
                    insert_outbox_events(txn, &events).await?;
                    Ok(())
                })
            })
            .await?;
        Ok(())
    }

    async fn rename_with_outbox(
        &self,
        id: Uuid,
        name: &str,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        let name = name.to_owned();
        let events = events.to_vec();
        self.db
            .transaction::<_, (), DirectoryError>(|txn| {
                Box::pin(async move {
                    let model = departments::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or(DirectoryError::DepartmentNotFound)?;
                    if let Some(parent_id) = model.parent_id {
                        let sibling = departments::Entity::find()
                            .filter(departments::Column::ParentId.eq(parent_id))
                            .filter(departments::Column::Name.eq(name.clone()))
                            .filter(departments::Column::Id.ne(id))
                            .lock_exclusive()
                            .one(txn)
                            .await?;
                        if sibling.is_some() {
                            return Err(DirectoryError::DuplicateName);
                        }
                    }
                    departments::ActiveModel {
                        id: Set(id),
                        name: Set(name),
                        updated_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .update(txn)
                    .await?;
                    insert_outbox_events(txn, &events).await?;
                    Ok(())
                })
            })
            .await?;
        Ok(())
    }

    async fn assign_user_with_outbox(
        &self,
        department_id: Uuid,
        user_id: Uuid,
        org_id: Uuid,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        let events = events.to_vec();
        self.db
            .transaction::<_, (), DirectoryError>(|txn| {
                Box::pin(async move {
                    let exists = departments::Entity::find_by_id(department_id)
                        .one(txn)
                        .await?;
                    if exists.is_none() {
                        return Err(DirectoryError::DepartmentNotFound);
                    }
                    let now = Utc::now();
                    // Re-assignment is a no-op, keeping the operation safe to
                    // retry end to end.
                    department_users::Entity::insert(department_users::ActiveModel {
                        department_id: Set(department_id),
                        user_id: Set(user_id),
                        created_at: Set(now),
                    })
                    .on_conflict(
                        OnConflict::columns([
                            department_users::Column::DepartmentId,
                            department_users::Column::UserId,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(txn)
                    .await?;
                    user_organizations::Entity::insert(user_organizations::ActiveModel {
                        user_id: Set(user_id),
                        org_id: Set(org_id),
                        created_at: Set(now),
                    })
                    .on_conflict(
                        OnConflict::columns([
                            user_organizations::Column::UserId,
                            user_organizations::Column::OrgId,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(txn)
                    .await?;
                    insert_outbox_events(txn, &events).await?;
                    Ok(())
                })
            })
            .await?;
        Ok(())
    }

    async fn children(&self, id: Uuid) -> Result<Vec<Department>, DirectoryError> {
        let models = departments::Entity::find()
            .filter(departments::Column::ParentId.eq(id))
            .order_by_asc(departments::Column::Name)
            .all(&self.db)
            .await
            .context("list department children")?;
        models.into_iter().map(department_from_model).collect()
    }

    async fn subtree(&self, path: &DeptPath) -> Result<Vec<Department>, DirectoryError> {
        let models = departments::Entity::find()
            .filter(subtree_condition(path))
            .all(&self.db)
            .await
            .context("load department subtree")?;
        models.into_iter().map(department_from_model).collect()
    }

    async fn memberships_intersecting(
        &self,
        path: &DeptPath,
    ) -> Result<Vec<UserMemberships>, DirectoryError> {
        // Users touched by the subtree, then their full membership across
        // the whole tree — the plan needs paths outside the subtree too.
        let subtree_ids: Vec<Uuid> = departments::Entity::find()
            .filter(subtree_condition(path))
            .all(&self.db)
            .await
            .context("load subtree ids")?
            .into_iter()
            .map(|d| d.id)
            .collect();

        let touched: BTreeSet<Uuid> = department_users::Entity::find()
            .filter(department_users::Column::DepartmentId.is_in(subtree_ids))
            .all(&self.db)
            .await
            .context("load subtree memberships")?
            .into_iter()
            .map(|r| r.user_id)
            .collect();
        if touched.is_empty() {
            return Ok(vec![]);
        }

        let rows = department_users::Entity::find()
            .filter(
                department_users::Column::UserId
                    .is_in(touched.iter().copied().collect::<Vec<_>>()),
            )
            .find_also_related(departments::Entity)
            .all(&self.db)
            .await
            .context("load full membership of affected users")?;

        let mut by_user: BTreeMap<Uuid, Vec<DeptPath>> =
            touched.into_iter().map(|u| (u, Vec::new())).collect();
        for (relation, department) in rows {
            // Sentinel rows have no department record and are not real
            // membership.
            let Some(department) = department else {
                continue;
            };
            let parsed = DeptPath::parse(&department.path)
                .map_err(|e| anyhow!("corrupt department path {:?}: {e}", department.path))?;
            if let Some(paths) = by_user.get_mut(&relation.user_id) {
                paths.push(parsed);
            }
        }

        Ok(by_user
            .into_iter()
            .map(|(user_id, paths)| UserMemberships { user_id, paths })
            .collect())
    }

    async fn managers_for_org(&self, org_id: Uuid) -> Result<Vec<ManagerRecord>, DirectoryError> {
        let rows = org_managers::Entity::find()
            .filter(org_managers::Column::OrgId.eq(org_id))
            .all(&self.db)
            .await
            .context("load org managers")?;
        Ok(rows
            .into_iter()
            .map(|m| ManagerRecord {
                manager_id: m.manager_id,
                department_id: m.department_id,
            })
            .collect())
    }

    async fn execute_cascade(
        &self,
        org_id: Uuid,
        plan: &CascadePlan,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        let plan = plan.clone();
        let events = events.to_vec();
        self.db
            .transaction::<_, (), DirectoryError>(|txn| {
                Box::pin(async move {
                    let affected = plan.affected_department_ids.clone();

                    // Relations scoped to the deleted subtree go first.
                    department_users::Entity::delete_many()
                        .filter(department_users::Column::DepartmentId.is_in(affected.clone()))
                        .exec(txn)
                        .await?;

                    // Relocate users whose last real membership disappeared.
                    if !plan.users_to_unassign.is_empty() {
                        let now = Utc::now();
                        let rows = plan.users_to_unassign.iter().map(|&user_id| {
                            department_users::ActiveModel {
                                department_id: Set(UNASSIGNED_DEPARTMENT_ID),
                                user_id: Set(user_id),
                                created_at: Set(now),
                            }
                        });
                        department_users::Entity::insert_many(rows)
                            .on_conflict(
                                OnConflict::columns([
                                    department_users::Column::DepartmentId,
                                    department_users::Column::UserId,
                                ])
                                .do_nothing()
                                .to_owned(),
                            )
                            .exec_without_returning(txn)
                            .await?;
                    }

                    // Sever organization relations for users with no
                    // remaining foothold in this org.
                    if !plan.users_to_detach_from_org.is_empty() {
                        user_organizations::Entity::delete_many()
                            .filter(user_organizations::Column::OrgId.eq(org_id))
                            .filter(
                                user_organizations::Column::UserId
                                    .is_in(plan.users_to_detach_from_org.clone()),
                            )
                            .exec(txn)
                            .await?;
                    }

                    // The subtree rows themselves. A mismatch means the tree
                    // changed under us; the whole cascade rolls back.
                    let deleted = departments::Entity::delete_many()
                        .filter(departments::Column::Id.is_in(affected.clone()))
                        .exec(txn)
                        .await?;
                    if deleted.rows_affected != affected.len() as u64 {
                        return Err(DirectoryError::Internal(anyhow!(
                            "cascade expected {} department rows, deleted {}",
                            affected.len(),
                            deleted.rows_affected
                        )));
                    }

                    org_managers::Entity::delete_many()
                        .filter(org_managers::Column::DepartmentId.is_in(affected))
                        .exec(txn)
                        .await?;

                    insert_outbox_events(txn, &events).await?;
                    Ok(())
                })
            })
            .await?;
        Ok(())
    }
}
