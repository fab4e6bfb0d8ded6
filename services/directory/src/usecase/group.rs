use chrono::Utc;
use uuid::Uuid;

use atrium_domain::event::{BusinessDomain, EventPayload};
use atrium_outbox::OutboxSignal;

use crate::domain::repository::GroupRepository;
use crate::domain::types::{Group, validate_name};
use crate::error::DirectoryError;

// ── CreateGroup ──────────────────────────────────────────────────────────────

pub struct CreateGroupInput {
    pub org_id: Uuid,
    pub name: String,
    pub member_ids: Vec<Uuid>,
    pub actor_id: Uuid,
}

pub struct CreateGroupUseCase<R: GroupRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: GroupRepository> CreateGroupUseCase<R> {
    pub async fn execute(&self, input: CreateGroupInput) -> Result<Group, DirectoryError> {
        if !validate_name(&input.name) {
            return Err(DirectoryError::InvalidName);
        }
        if self.repo.name_taken(input.org_id, &input.name).await? {
            return Err(DirectoryError::DuplicateName);
        }

        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4(),
            org_id: input.org_id,
            name: input.name,
            owner_id: input.actor_id,
            created_at: now,
            updated_at: now,
        };
        let events = [
            EventPayload::GroupCreated {
                group_id: group.id,
                org_id: group.org_id,
                name: group.name.clone(),
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::Group,
                actor_id: input.actor_id,
                operation: "group.create".to_owned(),
                subject: group.id.to_string(),
            },
        ];
        self.repo
            .create_with_outbox(&group, &input.member_ids, &events)
            .await?;
        self.signal.notify(BusinessDomain::Group);
        Ok(group)
    }
}

// ── RenameGroup ──────────────────────────────────────────────────────────────

pub struct RenameGroupInput {
    pub name: String,
    pub actor_id: Uuid,
}

pub struct RenameGroupUseCase<R: GroupRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: GroupRepository> RenameGroupUseCase<R> {
    pub async fn execute(
        &self,
        group_id: Uuid,
        input: RenameGroupInput,
    ) -> Result<(), DirectoryError> {
        if !validate_name(&input.name) {
            return Err(DirectoryError::InvalidName);
        }
        let group = self
            .repo
            .find_by_id(group_id)
            .await?
            .ok_or(DirectoryError::GroupNotFound)?;

        let events = [
            EventPayload::GroupUpdated {
                group_id,
                org_id: group.org_id,
                name: input.name.clone(),
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::Group,
                actor_id: input.actor_id,
                operation: "group.rename".to_owned(),
                subject: group_id.to_string(),
            },
        ];
        self.repo
            .rename_with_outbox(group_id, &input.name, &events)
            .await?;
        self.signal.notify(BusinessDomain::Group);
        Ok(())
    }
}

// ── DeleteGroup ──────────────────────────────────────────────────────────────

pub struct DeleteGroupUseCase<R: GroupRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: GroupRepository> DeleteGroupUseCase<R> {
    pub async fn execute(&self, group_id: Uuid, actor_id: Uuid) -> Result<(), DirectoryError> {
        let group = self
            .repo
            .find_by_id(group_id)
            .await?
            .ok_or(DirectoryError::GroupNotFound)?;

        let events = [
            EventPayload::GroupDeleted {
                group_id,
                org_id: group.org_id,
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::Group,
                actor_id,
                operation: "group.delete".to_owned(),
                subject: group_id.to_string(),
            },
        ];
        self.repo.delete_with_outbox(group_id, &events).await?;
        self.signal.notify(BusinessDomain::Group);
        Ok(())
    }
}
