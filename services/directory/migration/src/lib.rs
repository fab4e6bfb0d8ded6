use sea_orm_migration::prelude::*;

mod m20260401_000001_create_users;
mod m20260401_000002_create_departments;
mod m20260401_000003_create_groups;
mod m20260401_000004_create_contactors;
mod m20260401_000005_create_apps;
mod m20260401_000006_create_org_managers;
mod m20260401_000007_create_audit_logs;
mod m20260401_000008_create_outbox;
mod m20260401_000009_add_missing_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260401_000001_create_users::Migration),
            Box::new(m20260401_000002_create_departments::Migration),
            Box::new(m20260401_000003_create_groups::Migration),
            Box::new(m20260401_000004_create_contactors::Migration),
            Box::new(m20260401_000005_create_apps::Migration),
            Box::new(m20260401_000006_create_org_managers::Migration),
            Box::new(m20260401_000007_create_audit_logs::Migration),
            Box::new(m20260401_000008_create_outbox::Migration),
            Box::new(m20260401_000009_add_missing_indexes::Migration),
        ]
    }
}
