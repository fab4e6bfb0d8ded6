use chrono::Utc;
use uuid::Uuid;

use atrium_domain::event::{BusinessDomain, EventPayload};
use atrium_outbox::OutboxSignal;

use crate::domain::repository::ContactorRepository;
use crate::domain::types::{Contactor, validate_name};
use crate::error::DirectoryError;

// ── CreateContactor ──────────────────────────────────────────────────────────

pub struct CreateContactorInput {
    pub org_id: Uuid,
    pub name: String,
    pub member_ids: Vec<Uuid>,
    pub actor_id: Uuid,
}

pub struct CreateContactorUseCase<R: ContactorRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: ContactorRepository> CreateContactorUseCase<R> {
    pub async fn execute(&self, input: CreateContactorInput) -> Result<Contactor, DirectoryError> {
        if !validate_name(&input.name) {
            return Err(DirectoryError::InvalidName);
        }
        if self.repo.name_taken(input.org_id, &input.name).await? {
            return Err(DirectoryError::DuplicateName);
        }

        let now = Utc::now();
        let contactor = Contactor {
            id: Uuid::new_v4(),
            org_id: input.org_id,
            name: input.name,
            created_at: now,
            updated_at: now,
        };
        let events = [
            EventPayload::ContactorCreated {
                contactor_id: contactor.id,
                org_id: contactor.org_id,
                name: contactor.name.clone(),
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::Contactor,
                actor_id: input.actor_id,
                operation: "contactor.create".to_owned(),
                subject: contactor.id.to_string(),
            },
        ];
        self.repo
            .create_with_outbox(&contactor, &input.member_ids, &events)
            .await?;
        self.signal.notify(BusinessDomain::Contactor);
        Ok(contactor)
    }
}

// ── RenameContactor ──────────────────────────────────────────────────────────

pub struct RenameContactorInput {
    pub name: String,
    pub actor_id: Uuid,
}

pub struct RenameContactorUseCase<R: ContactorRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: ContactorRepository> RenameContactorUseCase<R> {
    pub async fn execute(
        &self,
        contactor_id: Uuid,
        input: RenameContactorInput,
    ) -> Result<(), DirectoryError> {
        if !validate_name(&input.name) {
            return Err(DirectoryError::InvalidName);
        }
        let contactor = self
            .repo
            .find_by_id(contactor_id)
            .await?
            .ok_or(DirectoryError::ContactorNotFound)?;

        let events = [
            EventPayload::ContactorUpdated {
                contactor_id,
                org_id: contactor.org_id,
                name: input.name.clone(),
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::Contactor,
                actor_id: input.actor_id,
                operation: "contactor.rename".to_owned(),
                subject: contactor_id.to_string(),
            },
        ];
        self.repo
            .rename_with_outbox(contactor_id, &input.name, &events)
            .await?;
        self.signal.notify(BusinessDomain::Contactor);
        Ok(())
    }
}

// ── DeleteContactor ──────────────────────────────────────────────────────────

pub struct DeleteContactorUseCase<R: ContactorRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: ContactorRepository> DeleteContactorUseCase<R> {
    pub async fn execute(&self, contactor_id: Uuid, actor_id: Uuid) -> Result<(), DirectoryError> {
        let contactor = self
            .repo
            .find_by_id(contactor_id)
            .await?
            .ok_or(DirectoryError::ContactorNotFound)?;

        let events = [
            EventPayload::ContactorDeleted {
                contactor_id,
                org_id: contactor.org_id,
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::Contactor,
                actor_id,
                operation: "contactor.delete".to_owned(),
                subject: contactor_id.to_string(),
            },
        ];
        self.repo.delete_with_outbox(contactor_id, &events).await?;
        self.signal.notify(BusinessDomain::Contactor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct MockContactorRepo {
        contactor: Option<Contactor>,
        taken: bool,
        events: Mutex<Vec<EventPayload>>,
    }

    impl ContactorRepository for MockContactorRepo {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Contactor>, DirectoryError> {
            Ok(self.contactor.clone())
        }
        async fn name_taken(&self, _org_id: Uuid, _name: &str) -> Result<bool, DirectoryError> {
            Ok(self.taken)
        }
        async fn create_with_outbox(
            &self,
            _contactor: &Contactor,
            _member_ids: &[Uuid],
            events: &[EventPayload],
        ) -> Result<(), DirectoryError> {
            self.events.lock().unwrap().extend_from_slice(events);
            Ok(())
        }
        async fn rename_with_outbox(
            &self,
            _id: Uuid,
            _name: &str,
            events: &[EventPayload],
        ) -> Result<(), DirectoryError> {
            self.events.lock().unwrap().extend_from_slice(events);
            Ok(())
        }
        async fn delete_with_outbox(
            &self,
            _id: Uuid,
            events: &[EventPayload],
        ) -> Result<(), DirectoryError> {
            self.events.lock().unwrap().extend_from_slice(events);
            Ok(())
        }
    }

    #[tokio::test]
    async fn should_create_contactor_and_enqueue_events() {
        let uc = CreateContactorUseCase {
            repo: MockContactorRepo {
                contactor: None,
                taken: false,
                events: Mutex::new(vec![]),
            },
            signal: OutboxSignal::new(),
        };
        let contactor = uc
            .execute(CreateContactorInput {
                org_id: Uuid::new_v4(),
                name: "support".into(),
                member_ids: vec![Uuid::new_v4()],
                actor_id: Uuid::new_v4(),
            })
            .await
            .unwrap();

        let events = uc.repo.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            EventPayload::ContactorCreated { contactor_id, .. } if *contactor_id == contactor.id
        ));
    }

    #[tokio::test]
    async fn should_return_not_found_when_deleting_unknown_contactor() {
        let uc = DeleteContactorUseCase {
            repo: MockContactorRepo {
                contactor: None,
                taken: false,
                events: Mutex::new(vec![]),
            },
            signal: OutboxSignal::new(),
        };
        let result = uc.execute(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(DirectoryError::ContactorNotFound)));
    }
}
