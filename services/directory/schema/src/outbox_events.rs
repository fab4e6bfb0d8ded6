use sea_orm::entity::prelude::*;

/// Outbox row: a domain event persisted in the same transaction as the
/// state change it describes, delivered asynchronously per business domain.
///
/// `id` is auto-incremented, so within one domain delivery order equals
/// insertion order. Rows stay `delivered_at = NULL` until the dispatcher
/// confirms the handler ran; failures only bump `attempts` and push
/// `next_attempt_at` out.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "outbox_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// `BusinessDomain` wire value.
    pub domain: i16,
    /// `EventKind` wire value.
    pub kind: i16,
    pub content: Json,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub next_attempt_at: chrono::DateTime<chrono::Utc>,
    pub delivered_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
