use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrgManagers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OrgManagers::ManagerId).uuid().not_null())
                    .col(ColumnDef::new(OrgManagers::DepartmentId).uuid().not_null())
                    .col(ColumnDef::new(OrgManagers::OrgId).uuid().not_null())
                    .col(
                        ColumnDef::new(OrgManagers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(OrgManagers::ManagerId)
                            .col(OrgManagers::DepartmentId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ManagerQuotas::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ManagerQuotas::ManagerId).uuid().not_null())
                    .col(ColumnDef::new(ManagerQuotas::OrgId).uuid().not_null())
                    .col(
                        ColumnDef::new(ManagerQuotas::QuotaBytes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ManagerQuotas::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ManagerQuotas::ManagerId)
                            .col(ManagerQuotas::OrgId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ManagerQuotas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrgManagers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OrgManagers {
    Table,
    ManagerId,
    DepartmentId,
    OrgId,
    CreatedAt,
}

#[derive(Iden)]
enum ManagerQuotas {
    Table,
    ManagerId,
    OrgId,
    QuotaBytes,
    UpdatedAt,
}
