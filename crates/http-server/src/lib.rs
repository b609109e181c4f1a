//! Inbound email webhook. Emails are logged, extracted and queued here; the
//! worker binary does the rest.

pub mod api;
pub mod core;

use crate::core::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/mailgun", post(api::webhook::mailgun_webhook_handler))
        .route("/metrics", get(api::metrics::metrics_handler))
        .route("/health", get(api::metrics::health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
