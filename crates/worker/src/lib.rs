//! Queue consumer: one poller feeding a fixed pool of workers that run each
//! message through a [`ingest::MessageHandler`].

pub mod config;
pub mod metrics;
pub mod pool;

pub use config::WorkerConfig;
pub use pool::{PoolSettings, WorkerPool};
