use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OutboxEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OutboxEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OutboxEvents::Domain)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OutboxEvents::Kind)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OutboxEvents::Content)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OutboxEvents::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(OutboxEvents::LastError).string())
                    .col(
                        ColumnDef::new(OutboxEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OutboxEvents::NextAttemptAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OutboxEvents::DeliveredAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OutboxLocks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OutboxLocks::Domain)
                            .small_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OutboxLocks::Holder).uuid())
                    .col(ColumnDef::new(OutboxLocks::AcquiredAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // One lock row per business domain; dispatchers only ever UPDATE these.
        let mut seed = Query::insert()
            .into_table(OutboxLocks::Table)
            .columns([OutboxLocks::Domain])
            .to_owned();
        for domain in 1..=9_i16 {
            seed.values_panic([domain.into()]);
        }
        manager.exec_stmt(seed).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OutboxLocks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OutboxEvents::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OutboxEvents {
    Table,
    Id,
    Domain,
    Kind,
    Content,
    Attempts,
    LastError,
    CreatedAt,
    NextAttemptAt,
    DeliveredAt,
}

#[derive(Iden)]
enum OutboxLocks {
    Table,
    Domain,
    Holder,
    AcquiredAt,
}
