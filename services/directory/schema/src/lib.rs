//! Sea-orm entities for the directory service.

pub mod apps;
pub mod audit_logs;
pub mod contactor_members;
pub mod contactors;
pub mod department_users;
pub mod departments;
pub mod group_members;
pub mod groups;
pub mod manager_quotas;
pub mod org_app_permissions;
pub mod org_managers;
pub mod outbox_events;
pub mod outbox_locks;
pub mod user_organizations;
pub mod users;
