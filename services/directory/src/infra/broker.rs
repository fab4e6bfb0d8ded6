use anyhow::Context as _;
use async_trait::async_trait;
use chrono::Utc;
use deadpool_redis::Pool;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use uuid::Uuid;

use atrium_directory_schema::audit_logs;

use crate::domain::repository::{AuditSink, MessageBroker};

/// Message broker backed by Redis pub/sub. Reached only from outbox
/// handlers, so every publish rides the at-least-once delivery guarantee.
#[derive(Clone)]
pub struct RedisBroker {
    pub pool: Pool,
}

#[async_trait]
impl MessageBroker for RedisBroker {
    async fn publish(
        &self,
        topic: &str,
        payload: &serde_json::Value,
    ) -> Result<(), anyhow::Error> {
        let mut conn = self.pool.get().await.context("get redis connection")?;
        deadpool_redis::redis::cmd("PUBLISH")
            .arg(topic)
            .arg(payload.to_string())
            .query_async::<()>(&mut conn)
            .await
            .context("publish to broker")?;
        Ok(())
    }
}

/// Audit sink backed by the `audit_logs` table.
#[derive(Clone)]
pub struct DbAuditSink {
    pub db: DatabaseConnection,
}

#[async_trait]
impl AuditSink for DbAuditSink {
    async fn record(
        &self,
        actor_id: Uuid,
        operation: &str,
        subject: &str,
    ) -> Result<(), anyhow::Error> {
        audit_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            actor_id: Set(actor_id),
            operation: Set(operation.to_owned()),
            subject: Set(subject.to_owned()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("write audit log")?;
        Ok(())
    }
}
