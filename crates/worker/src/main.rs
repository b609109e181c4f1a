use db::{PgMessageQueue, PgOrderStore, PgParserLogStore};
use dotenvy::dotenv;
use ingest::geocode::PeliasGeocoder;
use ingest::notify::HttpNotifier;
use ingest::{Metrics, OrderProcessor};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use worker::{WorkerConfig, WorkerPool};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    let db_pool = match db::connect(&config.database_url, config.db_max_connections).await {
        Ok(pool) => {
            info!("Database pool created successfully.");
            pool
        }
        Err(e) => {
            error!("Failed to create database pool: {}", e);
            return Err(e.into());
        }
    };
    if let Err(e) = db::run_migrations(&db_pool).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }

    let geocoder = Arc::new(PeliasGeocoder::new(
        &config.geocoder_url,
        config.geocoder_timeout,
        config.retry,
    )?);
    let notifier = Arc::new(HttpNotifier::new(
        config.notify_url.as_str(),
        config.notify_timeout,
        config.retry,
    )?);
    let processor = Arc::new(OrderProcessor::new(
        Arc::new(PgParserLogStore::new(db_pool.clone())),
        Arc::new(PgOrderStore::new(db_pool.clone())),
        geocoder,
        notifier,
    ));
    let queue = Arc::new(PgMessageQueue::new(db_pool, config.queue));
    let metrics = Arc::new(Metrics::new());

    let pool = WorkerPool::new(queue, processor, Arc::clone(&metrics), config.pool);

    let ctx = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(ctx.clone()));

    let metrics_server = tokio::spawn(worker::metrics::serve(
        config.metrics_port,
        Arc::clone(&metrics),
        ctx.clone(),
    ));

    pool.run(ctx).await;

    match metrics_server.await {
        Ok(Err(e)) => error!("Metrics server error: {}", e),
        Err(e) => error!("Metrics server task failed: {}", e),
        Ok(Ok(())) => {}
    }

    let snapshot = metrics.snapshot();
    info!(
        processed = snapshot.processed,
        failed = snapshot.failed,
        "Worker exited"
    );
    Ok(())
}

async fn shutdown_on_signal(ctx: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining workers");
    ctx.cancel();
}
