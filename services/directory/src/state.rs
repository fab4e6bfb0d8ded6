use sea_orm::DatabaseConnection;

use atrium_outbox::OutboxSignal;

use crate::infra::db::{
    DbAppRepository, DbContactorRepository, DbGroupRepository, DbOrgPermissionRepository,
    DbQuotaRepository,
};
use crate::infra::department::DbDepartmentRepository;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub signal: OutboxSignal,
}

impl AppState {
    pub fn app_repo(&self) -> DbAppRepository {
        DbAppRepository {
            db: self.db.clone(),
        }
    }

    pub fn department_repo(&self) -> DbDepartmentRepository {
        DbDepartmentRepository {
            db: self.db.clone(),
        }
    }

    pub fn group_repo(&self) -> DbGroupRepository {
        DbGroupRepository {
            db: self.db.clone(),
        }
    }

    pub fn contactor_repo(&self) -> DbContactorRepository {
        DbContactorRepository {
            db: self.db.clone(),
        }
    }

    pub fn org_perm_repo(&self) -> DbOrgPermissionRepository {
        DbOrgPermissionRepository {
            db: self.db.clone(),
        }
    }

    pub fn quota_repo(&self) -> DbQuotaRepository {
        DbQuotaRepository {
            db: self.db.clone(),
        }
    }
}
