use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use http_server::build_router;
use http_server::core::AppState;
use ingest::error::GeocodeError;
use ingest::geocode::{GeocodeResult, Geocoder};
use ingest::memory::{InMemoryQueue, InMemoryStore};
use ingest::{Enqueuer, ExtractionEngine, IntakeService, Metrics, QueueMessage};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const PLAIN_TEXT_ORDER: &str = "Order Number: 9001
Requested Vehicle Class: Sprinter Van 12
Pick Up Akron OH 44308 USA 2024-10-11 08:00 EDT (UTC-0400)
Delivery Erie PA 16501 USA 2024-10-11 16:00 EDT (UTC-0400)
Distance: 190 mi
";

struct NoGeocoder;

#[async_trait]
impl Geocoder for NoGeocoder {
    async fn search(&self, _text: &str) -> Result<GeocodeResult, GeocodeError> {
        Err(GeocodeError::NoFeatures)
    }
}

struct TestApp {
    router: Router,
    store: Arc<InMemoryStore>,
    queue: Arc<InMemoryQueue>,
}

fn setup() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let queue = Arc::new(InMemoryQueue::new());
    let metrics = Arc::new(Metrics::new());
    let engine = Arc::new(ExtractionEngine::with_default_vendors(Arc::new(NoGeocoder)));
    let intake = Arc::new(IntakeService::new(
        engine,
        Enqueuer::new(queue.clone()),
        store.clone(),
        metrics.clone(),
    ));
    TestApp {
        router: build_router(AppState { intake, metrics }),
        store,
        queue,
    }
}

fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn mailgun_post(fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mailgun")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form_body(fields)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn order_email_is_queued() {
    let app = setup();

    let response = app
        .router
        .clone()
        .oneshot(mailgun_post(&[
            ("subject", "Order 9001"),
            ("body-plain", PLAIN_TEXT_ORDER),
            ("Message-Id", "<9001@mail>"),
            ("reply-to", "dispatch@shipper.test"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "queued");
    assert_eq!(body["order_number"], "9001");

    assert_eq!(app.store.parser_log_count(), 1);
    assert_eq!(app.queue.len(), 1);
}

#[tokio::test]
async fn queued_envelope_carries_the_normalized_order() {
    use ingest::queue::MessageQueue;
    use std::time::Duration;

    let app = setup();
    app.router
        .clone()
        .oneshot(mailgun_post(&[
            ("subject", "Order 9001"),
            ("body-plain", PLAIN_TEXT_ORDER),
            ("reply-to", "dispatch@shipper.test"),
        ]))
        .await
        .unwrap();

    let received = app.queue.receive(1, Duration::ZERO).await.unwrap();
    let message: QueueMessage = serde_json::from_str(&received[0].body).unwrap();
    assert_eq!(message.order_number, "9001");
    assert_eq!(message.pickup_zip, "44308");
    assert_eq!(message.delivery_city, "Erie");
    assert_eq!(message.reply_to, "dispatch@shipper.test");
}

#[tokio::test]
async fn flatbed_email_is_ignored() {
    let app = setup();

    let response = app
        .router
        .clone()
        .oneshot(mailgun_post(&[(
            "body-plain",
            "Order Number: 1\nRequested Vehicle Class: Flatbed",
        )]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ignored");
    assert_eq!(app.store.parser_log_count(), 0);
    assert!(app.queue.is_empty());
}

#[tokio::test]
async fn empty_email_is_a_server_error() {
    let app = setup();

    let response = app
        .router
        .clone()
        .oneshot(mailgun_post(&[("subject", "nothing here")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
    assert!(app.queue.is_empty());
}

#[tokio::test]
async fn non_form_payload_is_rejected() {
    let app = setup();

    let request = Request::builder()
        .method("POST")
        .uri("/mailgun")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].is_string());
    assert_eq!(app.store.parser_log_count(), 0);
}

#[tokio::test]
async fn metrics_count_webhook_outcomes() {
    let app = setup();
    app.router
        .clone()
        .oneshot(mailgun_post(&[("body-plain", PLAIN_TEXT_ORDER)]))
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["received"], 1);
    assert_eq!(body["enqueued"], 1);
}

#[tokio::test]
async fn health_check_responds() {
    let app = setup();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}
