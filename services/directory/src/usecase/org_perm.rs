use chrono::Utc;
use uuid::Uuid;

use atrium_domain::event::{BusinessDomain, EventPayload};
use atrium_outbox::OutboxSignal;

use crate::domain::repository::OrgPermissionRepository;
use crate::domain::types::OrgAppPermission;
use crate::error::DirectoryError;

// ── GrantOrgPermission ───────────────────────────────────────────────────────

pub struct GrantOrgPermissionUseCase<R: OrgPermissionRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: OrgPermissionRepository> GrantOrgPermissionUseCase<R> {
    pub async fn execute(
        &self,
        org_id: Uuid,
        app_id: Uuid,
        actor_id: Uuid,
    ) -> Result<(), DirectoryError> {
        if self.repo.find(org_id, app_id).await?.is_some() {
            return Err(DirectoryError::AlreadyGranted);
        }

        let grant = OrgAppPermission {
            org_id,
            app_id,
            granted_by: actor_id,
            created_at: Utc::now(),
        };
        let events = [
            EventPayload::OrgPermGranted {
                org_id,
                app_id,
                actor_id,
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::OrgPermApp,
                actor_id,
                operation: "org_perm.grant".to_owned(),
                subject: format!("{org_id}:{app_id}"),
            },
        ];
        self.repo.grant_with_outbox(&grant, &events).await?;
        self.signal.notify(BusinessDomain::OrgPermApp);
        Ok(())
    }
}

// ── RevokeOrgPermission ──────────────────────────────────────────────────────

pub struct RevokeOrgPermissionUseCase<R: OrgPermissionRepository> {
    pub repo: R,
    pub signal: OutboxSignal,
}

impl<R: OrgPermissionRepository> RevokeOrgPermissionUseCase<R> {
    pub async fn execute(
        &self,
        org_id: Uuid,
        app_id: Uuid,
        actor_id: Uuid,
    ) -> Result<(), DirectoryError> {
        self.repo
            .find(org_id, app_id)
            .await?
            .ok_or(DirectoryError::PermissionNotFound)?;

        let events = [
            EventPayload::OrgPermRevoked {
                org_id,
                app_id,
                actor_id,
            },
            EventPayload::AuditRecorded {
                domain: BusinessDomain::OrgPermApp,
                actor_id,
                operation: "org_perm.revoke".to_owned(),
                subject: format!("{org_id}:{app_id}"),
            },
        ];
        self.repo.revoke_with_outbox(org_id, app_id, &events).await?;
        self.signal.notify(BusinessDomain::OrgPermApp);
        Ok(())
    }
}
