use crate::core::AppState;
use axum::{extract::State, Json};
use ingest::MetricsSnapshot;
use serde_json::{json, Value};

pub async fn metrics_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
