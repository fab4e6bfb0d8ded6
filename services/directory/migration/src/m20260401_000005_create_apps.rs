use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Apps::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Apps::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Apps::OrgId).uuid().not_null())
                    .col(ColumnDef::new(Apps::Name).string().not_null())
                    .col(ColumnDef::new(Apps::AppKey).string().not_null())
                    .col(
                        ColumnDef::new(Apps::Status)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Apps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Apps::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrgAppPermissions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OrgAppPermissions::OrgId).uuid().not_null())
                    .col(ColumnDef::new(OrgAppPermissions::AppId).uuid().not_null())
                    .col(
                        ColumnDef::new(OrgAppPermissions::GrantedBy)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrgAppPermissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(OrgAppPermissions::OrgId)
                            .col(OrgAppPermissions::AppId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrgAppPermissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Apps::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Apps {
    Table,
    Id,
    OrgId,
    Name,
    AppKey,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum OrgAppPermissions {
    Table,
    OrgId,
    AppId,
    GrantedBy,
    CreatedAt,
}
