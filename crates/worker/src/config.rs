use crate::pool::PoolSettings;
use db::QueueSettings;
use ingest::config::{self, ConfigError};
use ingest::RetryPolicy;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub geocoder_url: String,
    pub geocoder_timeout: Duration,
    pub notify_url: String,
    pub notify_timeout: Duration,
    pub retry: RetryPolicy,
    pub queue: QueueSettings,
    pub pool: PoolSettings,
    pub metrics_port: u16,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let queue_defaults = QueueSettings::default();
        let pool_defaults = PoolSettings::default();
        Ok(Self {
            database_url: config::required("DATABASE_URL")?,
            db_max_connections: config::parse_or("DB_MAX_CONNECTIONS", 5)?,
            geocoder_url: config::required("GEOCODER_URL")?,
            geocoder_timeout: config::secs_or("GEOCODER_TIMEOUT_SECS", 10)?,
            notify_url: config::required("NOTIFY_URL")?,
            notify_timeout: config::secs_or("NOTIFY_TIMEOUT_SECS", 10)?,
            retry: config::retry_policy()?,
            queue: QueueSettings {
                visibility_timeout: config::secs_or(
                    "QUEUE_VISIBILITY_TIMEOUT_SECS",
                    queue_defaults.visibility_timeout.as_secs(),
                )?,
                max_receives: config::parse_or("QUEUE_MAX_RECEIVES", queue_defaults.max_receives)?,
                ..queue_defaults
            },
            pool: PoolSettings {
                workers: config::parse_or("WORKER_COUNT", pool_defaults.workers)?,
                channel_capacity: config::parse_or(
                    "WORKER_CHANNEL_CAPACITY",
                    pool_defaults.channel_capacity,
                )?,
                batch_size: config::parse_or("QUEUE_BATCH_SIZE", pool_defaults.batch_size)?,
                wait_time: config::secs_or("QUEUE_WAIT_SECS", pool_defaults.wait_time.as_secs())?,
                ..pool_defaults
            },
            metrics_port: config::parse_or("METRICS_PORT", 2112)?,
        })
    }
}
