use chrono::Utc;
use rand::RngExt;
use uuid::Uuid;

use atrium_domain::event::{BusinessDomain, EventPayload};
use atrium_outbox::OutboxSignal;

use crate::domain::repository::AppRepository;
use crate::domain::types::{App, validate_name};
use crate::error::DirectoryError;

/// Charset for generated app keys (alphanumeric).
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// App key length in characters.
const APP_KEY_LEN: usize = 32;

fn generate_app_key() -> String {
    let mut rng = rand::rng();
    (0..APP_KEY_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

// ── RegisterApp ──────────────────────────────────────────────────────────────

pub struct RegisterAppInput {
    pub org_id: Uuid,
    pub name: String,
    pub actor_id: Uuid,
}

pub struct RegisterAppUseCase<R: AppRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: AppRepository> RegisterAppUseCase<R> {
    pub async fn execute(&self, input: RegisterAppInput) -> Result<App, DirectoryError> {
        // 1. Validate name → 400 on bad input, before anything opens
        if !validate_name(&input.name) {
            return Err(DirectoryError::InvalidName);
        }

        // 2. Fast duplicate check; re-validated inside the transaction
        if self.repo.name_taken(input.org_id, &input.name).await? {
            return Err(DirectoryError::DuplicateName);
        }

        // 3. Build the app with a generated key
        let now = Utc::now();
        let app = App {
            id: Uuid::new_v4(),
            org_id: input.org_id,
            name: input.name,
            app_key: generate_app_key(),
            status: 0,
            created_at: now,
            updated_at: now,
        };

        // 4. Write app + outbox events in one transaction
        let events = [
            EventPayload::AppRegistered {
                app_id: app.id,
                org_id: app.org_id,
                name: app.name.clone(),
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::App,
                actor_id: input.actor_id,
                operation: "app.register".to_owned(),
                subject: app.id.to_string(),
            },
        ];
        self.repo.register_with_outbox(&app, &events).await?;

        // 5. Wake the dispatcher after commit
        self.signal.notify(BusinessDomain::App);
        Ok(app)
    }
}

// ── UpdateApp ────────────────────────────────────────────────────────────────

pub struct UpdateAppInput {
    pub name: String,
    pub actor_id: Uuid,
}

pub struct UpdateAppUseCase<R: AppRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: AppRepository> UpdateAppUseCase<R> {
    pub async fn execute(&self, app_id: Uuid, input: UpdateAppInput) -> Result<(), DirectoryError> {
        if !validate_name(&input.name) {
            return Err(DirectoryError::InvalidName);
        }
        let app = self
            .repo
            .find_by_id(app_id)
            .await?
            .ok_or(DirectoryError::AppNotFound)?;

        let events = [
            EventPayload::AppUpdated {
                app_id,
                org_id: app.org_id,
                name: input.name.clone(),
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::App,
                actor_id: input.actor_id,
                operation: "app.update".to_owned(),
                subject: app_id.to_string(),
            },
        ];
        self.repo
            .rename_with_outbox(app_id, &input.name, &events)
            .await?;
        self.signal.notify(BusinessDomain::App);
        Ok(())
    }
}

// ── DeleteApp ────────────────────────────────────────────────────────────────

pub struct DeleteAppUseCase<R: AppRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: AppRepository> DeleteAppUseCase<R> {
    pub async fn execute(&self, app_id: Uuid, actor_id: Uuid) -> Result<(), DirectoryError> {
        let app = self
            .repo
            .find_by_id(app_id)
            .await?
            .ok_or(DirectoryError::AppNotFound)?;

        let events = [
            EventPayload::AppDeleted {
                app_id,
                org_id: app.org_id,
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::App,
                actor_id,
                operation: "app.delete".to_owned(),
                subject: app_id.to_string(),
            },
        ];
        self.repo.delete_with_outbox(app_id, &events).await?;
        self.signal.notify(BusinessDomain::App);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct MockAppRepo {
        app: Option<App>,
        taken: bool,
        events: Mutex<Vec<EventPayload>>,
    }

    impl MockAppRepo {
        fn new(app: Option<App>, taken: bool) -> Self {
            Self {
                app,
                taken,
                events: Mutex::new(vec![]),
            }
        }
    }

    impl AppRepository for MockAppRepo {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<App>, DirectoryError> {
            Ok(self.app.clone())
        }
        async fn name_taken(&self, _org_id: Uuid, _name: &str) -> Result<bool, DirectoryError> {
            Ok(self.taken)
        }
        async fn register_with_outbox(
            &self,
            _app: &App,
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

    fn test_app() -> App {
        let now = Utc::now();
        App {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            name: "billing".into(),
            app_key: "k".repeat(APP_KEY_LEN),
            status: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn should_reject_invalid_app_name() {
        let uc = RegisterAppUseCase {
            repo: MockAppRepo::new(None, false),
            signal: OutboxSignal::new(),
        };
        let result = uc
            .execute(RegisterAppInput {
                org_id: Uuid::new_v4(),
                name: "bad/name".into(),
                actor_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(result, Err(DirectoryError::InvalidName)));
    }

    #[tokio::test]
    async fn should_reject_duplicate_app_name_before_any_write() {
        let repo = MockAppRepo::new(None, true);
        let uc = RegisterAppUseCase {
            repo,
            signal: OutboxSignal::new(),
        };
        let result = uc
            .execute(RegisterAppInput {
                org_id: Uuid::new_v4(),
                name: "billing".into(),
                actor_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(result, Err(DirectoryError::DuplicateName)));
        assert!(uc.repo.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_register_app_and_enqueue_mutation_and_audit_events() {
        let uc = RegisterAppUseCase {
            repo: MockAppRepo::new(None, false),
            signal: OutboxSignal::new(),
        };
        let org_id = Uuid::new_v4();
        let app = uc
            .execute(RegisterAppInput {
                org_id,
                name: "billing".into(),
                actor_id: Uuid::new_v4(),
            })
            .await
            .unwrap();

        assert_eq!(app.app_key.len(), APP_KEY_LEN);
        let events = uc.repo.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            EventPayload::AppRegistered { app_id, .. } if *app_id == app.id
        ));
        assert!(matches!(
            &events[1],
            EventPayload::AuditRecorded { operation, .. } if operation == "app.register"
        ));
    }

    #[tokio::test]
    async fn should_return_not_found_when_deleting_unknown_app() {
        let uc = DeleteAppUseCase {
            repo: MockAppRepo::new(None, false),
            signal: OutboxSignal::new(),
        };
        let result = uc.execute(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(DirectoryError::AppNotFound)));
    }

    #[tokio::test]
    async fn should_enqueue_delete_and_audit_events_on_delete() {
        let app = test_app();
        let uc = DeleteAppUseCase {
            repo: MockAppRepo::new(Some(app.clone()), false),
            signal: OutboxSignal::new(),
        };
        uc.execute(app.id, Uuid::new_v4()).await.unwrap();

        let events = uc.repo.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            EventPayload::AppDeleted { app_id, org_id } if *app_id == app.id && *org_id == app.org_id
        ));
    }
}
