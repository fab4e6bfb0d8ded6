use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Departments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Departments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Departments::OrgId).uuid().not_null())
                    .col(ColumnDef::new(Departments::ParentId).uuid())
                    .col(ColumnDef::new(Departments::Name).string().not_null())
                    .col(
                        ColumnDef::new(Departments::Path)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Departments::ManagerId).uuid())
                    .col(
                        ColumnDef::new(Departments::Status)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Departments::IsRoot).boolean().not_null())
                    .col(
                        ColumnDef::new(Departments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Departments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DepartmentUsers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DepartmentUsers::DepartmentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DepartmentUsers::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(DepartmentUsers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(DepartmentUsers::DepartmentId)
                            .col(DepartmentUsers::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserOrganizations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserOrganizations::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserOrganizations::OrgId).uuid().not_null())
                    .col(
                        ColumnDef::new(UserOrganizations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(UserOrganizations::UserId)
                            .col(UserOrganizations::OrgId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserOrganizations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DepartmentUsers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Departments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Departments {
    Table,
    Id,
    OrgId,
    ParentId,
    Name,
    Path,
    ManagerId,
    Status,
    IsRoot,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum DepartmentUsers {
    Table,
    DepartmentId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum UserOrganizations {
    Table,
    UserId,
    OrgId,
    CreatedAt,
}
