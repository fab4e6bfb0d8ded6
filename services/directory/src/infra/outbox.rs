//! Database-backed outbox store and domain lock.

use anyhow::Context as _;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, sea_query::Expr,
};
use uuid::Uuid;

use atrium_directory_schema::{outbox_events, outbox_locks};
use atrium_domain::event::{BusinessDomain, EventKind, EventPayload};
use atrium_outbox::{DomainLock, OutboxError, OutboxRecord, OutboxStore};

/// Insert one outbox row per event through the caller's transaction handle,
/// so the rows commit or roll back together with the business writes they
/// describe. Every repository's `*_with_outbox` method ends with this call.
pub(crate) async fn insert_outbox_events(
    txn: &DatabaseTransaction,
    events: &[EventPayload],
) -> Result<(), sea_orm::DbErr> {
    let now = Utc::now();
    for event in events {
        let content = serde_json::to_value(event)
            .map_err(|e| sea_orm::DbErr::Custom(format!("serialize outbox payload: {e}")))?;
        outbox_events::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            domain: Set(event.domain().as_i16()),
            kind: Set(event.kind().as_i16()),
            content: Set(content),
            attempts: Set(0),
            last_error: Set(None),
            created_at: Set(now),
            next_attempt_at: Set(now),
            delivered_at: Set(None),
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

fn record_from_model(model: outbox_events::Model) -> Result<OutboxRecord, anyhow::Error> {
    Ok(OutboxRecord {
        id: model.id,
        domain: BusinessDomain::from_i16(model.domain)
            .ok_or_else(|| anyhow::anyhow!("unknown business domain {}", model.domain))?,
        kind: EventKind::from_i16(model.kind)
            .ok_or_else(|| anyhow::anyhow!("unknown event kind {}", model.kind))?,
        content: model.content,
        attempts: model.attempts,
        last_error: model.last_error,
        created_at: model.created_at,
        next_attempt_at: model.next_attempt_at,
        delivered_at: model.delivered_at,
    })
}

// ── Outbox store ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOutboxStore {
    pub db: DatabaseConnection,
}

#[async_trait]
impl OutboxStore for DbOutboxStore {
    async fn next_pending(
        &self,
        domain: BusinessDomain,
    ) -> Result<Option<OutboxRecord>, OutboxError> {
        let model = outbox_events::Entity::find()
            .filter(outbox_events::Column::Domain.eq(domain.as_i16()))
            .filter(outbox_events::Column::DeliveredAt.is_null())
            .filter(outbox_events::Column::NextAttemptAt.lte(Utc::now()))
            .order_by_asc(outbox_events::Column::Id)
            .one(&self.db)
            .await
            .context("find next pending outbox row")?;
        model
            .map(record_from_model)
            .transpose()
            .map_err(OutboxError::Storage)
    }

    async fn mark_delivered(&self, id: i64) -> Result<(), OutboxError> {
        // Guarded on delivered_at so crash-and-retry re-delivery keeps the
        // original timestamp.
        outbox_events::Entity::update_many()
            .col_expr(
                outbox_events::Column::DeliveredAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(outbox_events::Column::Id.eq(id))
            .filter(outbox_events::Column::DeliveredAt.is_null())
            .exec(&self.db)
            .await
            .context("mark outbox row delivered")?;
        Ok(())
    }

    async fn record_failure(
        &self,
        id: i64,
        error: &str,
        retry_at: DateTime<Utc>,
    ) -> Result<(), OutboxError> {
        outbox_events::Entity::update_many()
            .col_expr(
                outbox_events::Column::Attempts,
                Expr::col(outbox_events::Column::Attempts).add(1),
            )
            .col_expr(
                outbox_events::Column::LastError,
                Expr::value(Some(error.to_owned())),
            )
            .col_expr(outbox_events::Column::NextAttemptAt, Expr::value(retry_at))
            .filter(outbox_events::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("record outbox delivery failure")?;
        Ok(())
    }
}

// ── Domain lock ──────────────────────────────────────────────────────────────

/// Lock-table mutual exclusion between dispatcher replicas. `holder` is a
/// per-process id; a lock whose `acquired_at` is older than the TTL is
/// considered abandoned and may be stolen.
#[derive(Clone)]
pub struct DbDomainLock {
    db: DatabaseConnection,
    holder: Uuid,
    ttl: chrono::Duration,
}

impl DbDomainLock {
    pub fn new(db: DatabaseConnection, ttl_secs: u64) -> Self {
        Self {
            db,
            holder: Uuid::new_v4(),
            ttl: chrono::Duration::seconds(ttl_secs as i64),
        }
    }
}

#[async_trait]
impl DomainLock for DbDomainLock {
    async fn try_acquire(&self, domain: BusinessDomain) -> Result<bool, OutboxError> {
        let now = Utc::now();
        let stale_before = now - self.ttl;
        let result = outbox_locks::Entity::update_many()
            .col_expr(outbox_locks::Column::Holder, Expr::value(Some(self.holder)))
            .col_expr(outbox_locks::Column::AcquiredAt, Expr::value(Some(now)))
            .filter(outbox_locks::Column::Domain.eq(domain.as_i16()))
            .filter(
                Condition::any()
                    .add(outbox_locks::Column::Holder.is_null())
                    .add(outbox_locks::Column::Holder.eq(self.holder))
                    .add(outbox_locks::Column::AcquiredAt.lt(stale_before)),
            )
            .exec(&self.db)
            .await
            .context("acquire domain lock")?;
        Ok(result.rows_affected > 0)
    }

    async fn release(&self, domain: BusinessDomain) -> Result<(), OutboxError> {
        outbox_locks::Entity::update_many()
            .col_expr(outbox_locks::Column::Holder, Expr::value(None::<Uuid>))
            .col_expr(
                outbox_locks::Column::AcquiredAt,
                Expr::value(None::<DateTime<Utc>>),
            )
            .filter(outbox_locks::Column::Domain.eq(domain.as_i16()))
            .filter(outbox_locks::Column::Holder.eq(self.holder))
            .exec(&self.db)
            .await
            .context("release domain lock")?;
        Ok(())
    }
}
