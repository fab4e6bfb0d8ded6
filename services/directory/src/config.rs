use serde::Deserialize;

use atrium_core::config::Config;

/// Directory service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct DirectoryConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// Redis connection URL for the message broker. Env var: `REDIS_URL`.
    pub redis_url: String,
    /// TCP port for the HTTP server (default 3121). Env var: `DIRECTORY_PORT`.
    #[serde(default = "default_port")]
    pub directory_port: u16,
    /// Seconds before a dispatcher lock may be stolen from a dead replica.
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
    /// Dispatcher poll fallback in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_port() -> u16 {
    3121
}

fn default_lock_ttl_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    10
}

impl Config for DirectoryConfig {}
