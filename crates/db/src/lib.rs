pub mod models;
pub mod services;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub use services::error::ServiceError;
pub use services::order::PgOrderStore;
pub use services::parser_log::PgParserLogStore;
pub use services::queue::{PgMessageQueue, QueueSettings};

pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Applies the bundled migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
