use std::sync::Arc;
use std::time::Duration;

use sea_orm::Database;
use tracing::info;

use atrium_core::config::Config;
use atrium_core::tracing::init_tracing;
use atrium_outbox::{DispatcherConfig, DispatcherGroup, OutboxSignal, RetryPolicy};

use atrium_directory::config::DirectoryConfig;
use atrium_directory::domain::repository::{AuditSink, MessageBroker};
use atrium_directory::events::build_registry;
use atrium_directory::infra::broker::{DbAuditSink, RedisBroker};
use atrium_directory::infra::db::DbQuotaRepository;
use atrium_directory::infra::outbox::{DbDomainLock, DbOutboxStore};
use atrium_directory::router::build_router;
use atrium_directory::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = DirectoryConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis = deadpool_redis::Config::from_url(&config.redis_url)
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create redis pool");

    // Handler registry is built once, from the static table in events.rs;
    // a duplicate registration is a startup failure, not a silent override.
    let broker: Arc<dyn MessageBroker> = Arc::new(RedisBroker { pool: redis });
    let audit: Arc<dyn AuditSink> = Arc::new(DbAuditSink { db: db.clone() });
    let registry = build_registry(broker, audit, DbQuotaRepository { db: db.clone() })
        .expect("invalid handler registry");

    // One background dispatcher per business domain.
    let signal = OutboxSignal::new();
    let store = DbOutboxStore { db: db.clone() };
    let lock = DbDomainLock::new(db.clone(), config.lock_ttl_secs);
    let dispatchers = DispatcherGroup::spawn(
        &store,
        &lock,
        Arc::new(registry),
        &signal,
        DispatcherConfig {
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            retry: RetryPolicy::default(),
        },
    );

    let state = AppState { db, signal };
    let router = build_router(state);
    let http_addr = format!("0.0.0.0:{}", config.directory_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("directory service listening on {http_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("server error");

    // Let in-flight outbox cycles finish before the process exits.
    dispatchers.shutdown_and_join().await;
}
