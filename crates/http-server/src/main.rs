use db::{PgMessageQueue, PgParserLogStore};
use dotenvy::dotenv;
use http_server::build_router;
use http_server::core::{AppConfig, AppState};
use ingest::geocode::PeliasGeocoder;
use ingest::{Enqueuer, ExtractionEngine, IntakeService, Metrics};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    // --- Database Pool ---
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

    // --- Pipeline ---
    let geocoder = Arc::new(PeliasGeocoder::new(
        &config.geocoder_url,
        config.geocoder_timeout,
        config.retry,
    )?);
    let queue = Arc::new(PgMessageQueue::new(db_pool.clone(), config.queue));
    let parser_logs = Arc::new(PgParserLogStore::new(db_pool));
    let metrics = Arc::new(Metrics::new());
    let engine = Arc::new(ExtractionEngine::with_default_vendors(geocoder));
    let intake = Arc::new(IntakeService::new(
        engine,
        Enqueuer::new(queue),
        parser_logs,
        Arc::clone(&metrics),
    ));

    let app = build_router(AppState { intake, metrics });

    // Bind to 0.0.0.0 to be reachable in a container
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("HTTP Server listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
        }
    });
    if let Err(e) = server.await {
        error!("Server error: {}", e);
    }

    Ok(())
}
