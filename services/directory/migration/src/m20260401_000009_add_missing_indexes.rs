use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Domain-scoped ordered scan for the dispatcher.
        manager
            .create_index(
                Index::create()
                    .table(OutboxEvents::Table)
                    .col(OutboxEvents::Domain)
                    .col(OutboxEvents::Id)
                    .name("idx_outbox_events_domain_id")
                    .to_owned(),
            )
            .await?;
        // Membership lookups by user (cascade planning reads).
        manager
            .create_index(
                Index::create()
                    .table(DepartmentUsers::Table)
                    .col(DepartmentUsers::UserId)
                    .name("idx_department_users_user_id")
                    .to_owned(),
            )
            .await?;
        // Manager scope intersection during cascade planning.
        manager
            .create_index(
                Index::create()
                    .table(OrgManagers::Table)
                    .col(OrgManagers::DepartmentId)
                    .name("idx_org_managers_department_id")
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(Departments::Table)
                    .col(Departments::OrgId)
                    .name("idx_departments_org_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_departments_org_id").to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_org_managers_department_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_department_users_user_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_outbox_events_domain_id").to_owned())
            .await
    }
}

#[derive(Iden)]
enum OutboxEvents {
    Table,
    Domain,
    Id,
}

#[derive(Iden)]
enum DepartmentUsers {
    Table,
    UserId,
}

#[derive(Iden)]
enum OrgManagers {
    Table,
    DepartmentId,
}

#[derive(Iden)]
enum Departments {
    Table,
    OrgId,
}
