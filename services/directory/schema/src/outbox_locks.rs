use sea_orm::entity::prelude::*;

/// Per-domain dispatch lock. One row per business domain, seeded by
/// migration; `holder` names the replica currently draining the domain.
/// A stale `acquired_at` lets another replica steal the lock.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "outbox_locks")]
pub struct Model {
    /// `BusinessDomain` wire value.
    #[sea_orm(primary_key, auto_increment = false)]
    pub domain: i16,
    pub holder: Option<Uuid>,
    pub acquired_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
