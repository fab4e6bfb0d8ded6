use chrono::{DateTime, Utc};
use uuid::Uuid;

use atrium_domain::path::DeptPath;

/// Application account registered for an organization.
#[derive(Debug, Clone)]
pub struct App {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub app_key: String,
    /// 0 = active, 1 = disabled.
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Department node. `path` is the authoritative tree position.
#[derive(Debug, Clone)]
pub struct Department {
    pub id: Uuid,
    pub org_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub path: DeptPath,
    pub manager_id: Option<Uuid>,
    /// 0 = active, 1 = disabled.
    pub status: i16,
    pub is_root: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User group within an organization.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contactor list.
#[derive(Debug, Clone)]
pub struct Contactor {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Grant allowing an app to act within an organization.
#[derive(Debug, Clone)]
pub struct OrgAppPermission {
    pub org_id: Uuid,
    pub app_id: Uuid,
    pub granted_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Maximum length of app, department, group, and contactor names.
pub const MAX_NAME_LEN: usize = 64;

/// Entity name validation shared by every register/rename operation.
/// Names are trimmed nowhere — the caller sends exactly what gets stored.
pub fn validate_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().count() <= MAX_NAME_LEN
        && !name.contains('/')
        && name.trim() == name
}
