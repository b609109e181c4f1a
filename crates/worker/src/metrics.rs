use axum::{extract::State, routing::get, Json, Router};
use ingest::{Metrics, MetricsSnapshot};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /metrics` with the pool's processed and failed counters, plus `/health`.
pub fn router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(metrics)
}

/// Serves [`router`] until `ctx` is cancelled.
pub async fn serve(
    port: u16,
    metrics: Arc<Metrics>,
    ctx: CancellationToken,
) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Metrics listening on {}", addr);
    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(async move { ctx.cancelled().await })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn exposes_processing_counters() {
        let metrics = Arc::new(Metrics::new());
        metrics.record_processed();
        metrics.record_failed();
        metrics.record_failed();

        let request = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = router(metrics).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["processed"], 1);
        assert_eq!(body["failed"], 2);
    }

    #[tokio::test]
    async fn serve_stops_on_cancel() {
        let ctx = CancellationToken::new();
        let server = tokio::spawn(serve(0, Arc::new(Metrics::new()), ctx.clone()));
        ctx.cancel();
        let result = tokio::time::timeout(std::time::Duration::from_secs(2), server)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
