use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contactors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contactors::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contactors::OrgId).uuid().not_null())
                    .col(ColumnDef::new(Contactors::Name).string().not_null())
                    .col(
                        ColumnDef::new(Contactors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Contactors::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContactorMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContactorMembers::ContactorId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContactorMembers::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ContactorMembers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ContactorMembers::ContactorId)
                            .col(ContactorMembers::UserId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContactorMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contactors::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Contactors {
    Table,
    Id,
    OrgId,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ContactorMembers {
    Table,
    ContactorId,
    UserId,
    CreatedAt,
}
