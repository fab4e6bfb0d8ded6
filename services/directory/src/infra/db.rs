//! Sea-orm repository implementations for apps, groups, contactors,
//! org permissions, and manager quotas.

use std::collections::BTreeSet;

use anyhow::{Context as _, anyhow};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, TransactionTrait, sea_query::OnConflict,
};
use uuid::Uuid;

use atrium_directory_schema::{
    apps, contactor_members, contactors, department_users, departments, group_members, groups,
    manager_quotas, org_app_permissions, org_managers, users,
};
use atrium_domain::cascade::UNASSIGNED_DEPARTMENT_ID;
use atrium_domain::event::EventPayload;
use atrium_domain::path::DeptPath;

use crate::domain::repository::{
    AppRepository, ContactorRepository, GroupRepository, OrgPermissionRepository, QuotaRepository,
};
use crate::domain::types::{App, Contactor, Group, OrgAppPermission};
use crate::error::DirectoryError;
use crate::infra::outbox::insert_outbox_events;

// ── App repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAppRepository {
    pub db: DatabaseConnection,
}

fn app_from_model(model: apps::Model) -> App {
    App {
        id: model.id,
        org_id: model.org_id,
        name: model.name,
        app_key: model.app_key,
        status: model.status,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

impl AppRepository for DbAppRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<App>, DirectoryError> {
        let model = apps::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find app by id")?;
        Ok(model.map(app_from_model))
    }

    async fn name_taken(&self, org_id: Uuid, name: &str) -> Result<bool, DirectoryError> {
        let count = apps::Entity::find()
            .filter(apps::Column::OrgId.eq(org_id))
            .filter(apps::Column::Name.eq(name))
            .count(&self.db)
            .await
            .context("check app name")?;
        Ok(count > 0)
    }

    async fn register_with_outbox(
        &self,
        app: &App,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        let app = app.clone();
        let events = events.to_vec();
        self.db
            .transaction::<_, (), DirectoryError>(|txn| {
                Box::pin(async move {
                    // Re-validate name uniqueness under a row lock: the
                    // pre-check outside the transaction cannot exclude a
                    // concurrent register of the same name.
                    let existing = apps::Entity::find()
                        .filter(apps::Column::OrgId.eq(app.org_id))
                        .filter(apps::Column::Name.eq(app.name.clone()))
                        .lock_exclusive()
                        .one(txn)
                        .await?;
                    if existing.is_some() {
                        return Err(DirectoryError::DuplicateName);
                    }
                    apps::ActiveModel {
                        id: Set(app.id),
                        org_id: Set(app.org_id),
                        name: Set(app.name.clone()),
                        app_key: Set(app.app_key.clone()),
                        status: Set(app.status),
                        created_at: Set(app.created_at),
                        updated_at: Set(app.updated_at),
                    }
                    .insert(txn)
                    .await?;
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
                    let model = apps::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or(DirectoryError::AppNotFound)?;
                    let duplicate = apps::Entity::find()
                        .filter(apps::Column::OrgId.eq(model.org_id))
                        .filter(apps::Column::Name.eq(name.clone()))
                        .filter(apps::Column::Id.ne(id))
                        .lock_exclusive()
                        .one(txn)
                        .await?;
                    if duplicate.is_some() {
                        return Err(DirectoryError::DuplicateName);
                    }
                    apps::ActiveModel {
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

    async fn delete_with_outbox(
        &self,
        id: Uuid,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        let events = events.to_vec();
        self.db
            .transaction::<_, (), DirectoryError>(|txn| {
                Box::pin(async move {
                    let result = apps::Entity::delete_by_id(id).exec(txn).await?;
                    if result.rows_affected == 0 {
                        return Err(DirectoryError::AppNotFound);
                    }
                    org_app_permissions::Entity::delete_many()
                        .filter(org_app_permissions::Column::AppId.eq(id))
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

// ── Group repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbGroupRepository {
    pub db: DatabaseConnection,
}

fn group_from_model(model: groups::Model) -> Group {
    Group {
        id: model.id,
        org_id: model.org_id,
        name: model.name,
        owner_id: model.owner_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

impl GroupRepository for DbGroupRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Group>, DirectoryError> {
        let model = groups::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find group by id")?;
        Ok(model.map(group_from_model))
    }

    async fn name_taken(&self, org_id: Uuid, name: &str) -> Result<bool, DirectoryError> {
        let count = groups::Entity::find()
            .filter(groups::Column::OrgId.eq(org_id))
            .filter(groups::Column::Name.eq(name))
            .count(&self.db)
            .await
            .context("check group name")?;
        Ok(count > 0)
    }

    async fn create_with_outbox(
        &self,
        group: &Group,
        member_ids: &[Uuid],
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        let group = group.clone();
        let member_ids = member_ids.to_vec();
        let events = events.to_vec();
        self.db
            .transaction::<_, (), DirectoryError>(|txn| {
                Box::pin(async move {
                    let existing = groups::Entity::find()
                        .filter(groups::Column::OrgId.eq(group.org_id))
                        .filter(groups::Column::Name.eq(group.name.clone()))
                        .lock_exclusive()
                        .one(txn)
                        .await?;
                    if existing.is_some() {
                        return Err(DirectoryError::DuplicateName);
                    }
                    groups::ActiveModel {
                        id: Set(group.id),
                        org_id: Set(group.org_id),
                        name: Set(group.name.clone()),
                        owner_id: Set(group.owner_id),
                        created_at: Set(group.created_at),
                        updated_at: Set(group.updated_at),
                    }
                    .insert(txn)
                    .await?;
                    if !member_ids.is_empty() {
                        let now = Utc::now();
                        let rows = member_ids.iter().map(|&user_id| group_members::ActiveModel {
                            group_id: Set(group.id),
                            user_id: Set(user_id),
                            created_at: Set(now),
                        });
                        group_members::Entity::insert_many(rows).exec(txn).await?;
                    }
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
                    let model = groups::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or(DirectoryError::GroupNotFound)?;
                    let duplicate = groups::Entity::find()
                        .filter(groups::Column::OrgId.eq(model.org_id))
                        .filter(groups::Column::Name.eq(name.clone()))
                        .filter(groups::Column::Id.ne(id))
                        .lock_exclusive()
                        .one(txn)
                        .await?;
                    if duplicate.is_some() {
                        return Err(DirectoryError::DuplicateName);
                    }
                    groups::ActiveModel {
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

    async fn delete_with_outbox(
        &self,
        id: Uuid,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        let events = events.to_vec();
        self.db
            .transaction::<_, (), DirectoryError>(|txn| {
                Box::pin(async move {
                    group_members::Entity::delete_many()
                        .filter(group_members::Column::GroupId.eq(id))
                        .exec(txn)
                        .await?;
                    let result = groups::Entity::delete_by_id(id).exec(txn).await?;
                    if result.rows_affected == 0 {
                        return Err(DirectoryError::GroupNotFound);
                    }
                    insert_outbox_events(txn, &events).await?;
                    Ok(())
                })
            })
            .await?;
        Ok(())
    }
}

// ── Contactor repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbContactorRepository {
    pub db: DatabaseConnection,
}

fn contactor_from_model(model: contactors::Model) -> Contactor {
    Contactor {
        id: model.id,
        org_id: model.org_id,
        name: model.name,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

impl ContactorRepository for DbContactorRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contactor>, DirectoryError> {
        let model = contactors::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find contactor by id")?;
        Ok(model.map(contactor_from_model))
    }

    async fn name_taken(&self, org_id: Uuid, name: &str) -> Result<bool, DirectoryError> {
        let count = contactors::Entity::find()
            .filter(contactors::Column::OrgId.eq(org_id))
            .filter(contactors::Column::Name.eq(name))
            .count(&self.db)
            .await
            .context("check contactor name")?;
        Ok(count > 0)
    }

    async fn create_with_outbox(
        &self,
        contactor: &Contactor,
        member_ids: &[Uuid],
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        let contactor = contactor.clone();
        let member_ids = member_ids.to_vec();
        let events = events.to_vec();
        self.db
            .transaction::<_, (), DirectoryError>(|txn| {
                Box::pin(async move {
                    let existing = contactors::Entity::find()
                        .filter(contactors::Column::OrgId.eq(contactor.org_id))
                        .filter(contactors::Column::Name.eq(contactor.name.clone()))
                        .lock_exclusive()
                        .one(txn)
                        .await?;
                    if existing.is_some() {
                        return Err(DirectoryError::DuplicateName);
                    }
                    contactors::ActiveModel {
                        id: Set(contactor.id),
                        org_id: Set(contactor.org_id),
                        name: Set(contactor.name.clone()),
                        created_at: Set(contactor.created_at),
                        updated_at: Set(contactor.updated_at),
                    }
                    .insert(txn)
                    .await?;
                    if !member_ids.is_empty() {
                        let now = Utc::now();
                        let rows =
                            member_ids
                                .iter()
                                .map(|&user_id| contactor_members::ActiveModel {
                                    contactor_id: Set(contactor.id),
                                    user_id: Set(user_id),
                                    created_at: Set(now),
                                });
                        contactor_members::Entity::insert_many(rows).exec(txn).await?;
                    }
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
                    let model = contactors::Entity::find_by_id(id)
                        .one(txn)
                        .await?
                        .ok_or(DirectoryError::ContactorNotFound)?;
                    let duplicate = contactors::Entity::find()
                        .filter(contactors::Column::OrgId.eq(model.org_id))
                        .filter(contactors::Column::Name.eq(name.clone()))
                        .filter(contactors::Column::Id.ne(id))
                        .lock_exclusive()
                        .one(txn)
                        .await?;
                    if duplicate.is_some() {
                        return Err(DirectoryError::DuplicateName);
                    }
                    contactors::ActiveModel {
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

    async fn delete_with_outbox(
        &self,
        id: Uuid,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        let events = events.to_vec();
        self.db
            .transaction::<_, (), DirectoryError>(|txn| {
                Box::pin(async move {
                    contactor_members::Entity::delete_many()
                        .filter(contactor_members::Column::ContactorId.eq(id))
                        .exec(txn)
                        .await?;
                    let result = contactors::Entity::delete_by_id(id).exec(txn).await?;
                    if result.rows_affected == 0 {
                        return Err(DirectoryError::ContactorNotFound);
                    }
                    insert_outbox_events(txn, &events).await?;
                    Ok(())
                })
            })
            .await?;
        Ok(())
    }
}

// ── Org permission repository ────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOrgPermissionRepository {
    pub db: DatabaseConnection,
}

impl OrgPermissionRepository for DbOrgPermissionRepository {
    async fn find(
        &self,
        org_id: Uuid,
        app_id: Uuid,
    ) -> Result<Option<OrgAppPermission>, DirectoryError> {
        let model = org_app_permissions::Entity::find_by_id((org_id, app_id))
            .one(&self.db)
            .await
            .context("find org app permission")?;
        Ok(model.map(|m| OrgAppPermission {
            org_id: m.org_id,
            app_id: m.app_id,
            granted_by: m.granted_by,
            created_at: m.created_at,
        }))
    }

    async fn grant_with_outbox(
        &self,
        grant: &OrgAppPermission,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        let grant = grant.clone();
        let events = events.to_vec();
        self.db
            .transaction::<_, (), DirectoryError>(|txn| {
                Box::pin(async move {
                    let existing = org_app_permissions::Entity::find_by_id((
                        grant.org_id,
                        grant.app_id,
                    ))
                    .lock_exclusive()
                    .one(txn)
                    .await?;
                    if existing.is_some() {
                        return Err(DirectoryError::AlreadyGranted);
                    }
                    org_app_permissions::ActiveModel {
                        org_id: Set(grant.org_id),
                        app_id: Set(grant.app_id),
                        granted_by: Set(grant.granted_by),
                        created_at: Set(grant.created_at),
                    }
                    .insert(txn)
                    .await?;
                    insert_outbox_events(txn, &events).await?;
                    Ok(())
                })
            })
            .await?;
        Ok(())
    }

    async fn revoke_with_outbox(
        &self,
        org_id: Uuid,
        app_id: Uuid,
        events: &[EventPayload],
    ) -> Result<(), DirectoryError> {
        let events = events.to_vec();
        self.db
            .transaction::<_, (), DirectoryError>(|txn| {
                Box::pin(async move {
                    let result = org_app_permissions::Entity::delete_by_id((org_id, app_id))
                        .exec(txn)
                        .await?;
                    if result.rows_affected == 0 {
                        return Err(DirectoryError::PermissionNotFound);
                    }
                    insert_outbox_events(txn, &events).await?;
                    Ok(())
                })
            })
            .await?;
        Ok(())
    }
}

// ── Quota repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbQuotaRepository {
    pub db: DatabaseConnection,
}

impl QuotaRepository for DbQuotaRepository {
    async fn managed_paths(
        &self,
        manager_id: Uuid,
        org_id: Uuid,
    ) -> Result<Vec<DeptPath>, DirectoryError> {
        let assignments = org_managers::Entity::find()
            .filter(org_managers::Column::ManagerId.eq(manager_id))
            .filter(org_managers::Column::OrgId.eq(org_id))
            .all(&self.db)
            .await
            .context("load manager assignments")?;
        let dept_ids: Vec<Uuid> = assignments.into_iter().map(|m| m.department_id).collect();
        if dept_ids.is_empty() {
            return Ok(vec![]);
        }
        let models = departments::Entity::find()
            .filter(departments::Column::Id.is_in(dept_ids))
            .all(&self.db)
            .await
            .context("load managed departments")?;
        models
            .into_iter()
            .map(|m| {
                DeptPath::parse(&m.path)
                    .map_err(|e| anyhow!("corrupt department path {:?}: {e}", m.path).into())
            })
            .collect()
    }

    async fn sum_user_quota_under(&self, paths: &[DeptPath]) -> Result<i64, DirectoryError> {
        let mut subtree_filter = Condition::any();
        for path in paths {
            subtree_filter = subtree_filter
                .add(departments::Column::Path.eq(path.as_str()))
                .add(departments::Column::Path.like(format!("{}/%", path.as_str())));
        }
        let dept_ids: Vec<Uuid> = departments::Entity::find()
            .filter(subtree_filter)
            .all(&self.db)
            .await
            .context("load quota subtrees")?
            .into_iter()
            .map(|d| d.id)
            .collect();
        if dept_ids.is_empty() {
            return Ok(0);
        }

        // Users are counted once even when they sit in several of the
        // manager's departments.
        let user_ids: BTreeSet<Uuid> = department_users::Entity::find()
            .filter(department_users::Column::DepartmentId.is_in(dept_ids))
            .all(&self.db)
            .await
            .context("load quota memberships")?
            .into_iter()
            .map(|r| r.user_id)
            .collect();
        if user_ids.is_empty() {
            return Ok(0);
        }

        let quota_users = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids.into_iter().collect::<Vec<_>>()))
            .all(&self.db)
            .await
            .context("load user quotas")?;
        Ok(quota_users.into_iter().map(|u| u.space_quota).sum())
    }

    async fn is_unassigned(&self, user_id: Uuid) -> Result<bool, DirectoryError> {
        let memberships = department_users::Entity::find()
            .filter(department_users::Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .context("load user memberships")?;
        Ok(!memberships.is_empty()
            && memberships
                .iter()
                .all(|m| m.department_id == UNASSIGNED_DEPARTMENT_ID))
    }

    async fn upsert_quota(
        &self,
        manager_id: Uuid,
        org_id: Uuid,
        quota_bytes: i64,
    ) -> Result<(), DirectoryError> {
        manager_quotas::Entity::insert(manager_quotas::ActiveModel {
            manager_id: Set(manager_id),
            org_id: Set(org_id),
            quota_bytes: Set(quota_bytes),
            updated_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([
                manager_quotas::Column::ManagerId,
                manager_quotas::Column::OrgId,
            ])
            .update_columns([
                manager_quotas::Column::QuotaBytes,
                manager_quotas::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .context("upsert manager quota")?;
        Ok(())
    }

    async fn delete_quota(&self, manager_id: Uuid, org_id: Uuid) -> Result<(), DirectoryError> {
        manager_quotas::Entity::delete_by_id((manager_id, org_id))
            .exec(&self.db)
            .await
            .context("delete manager quota")?;
        Ok(())
    }
}
