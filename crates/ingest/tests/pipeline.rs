//! Webhook-side intake through the queue into order persistence, using the
//! in-memory adapters.

use async_trait::async_trait;
use ingest::error::{GeocodeError, NotifyError};
use ingest::geocode::{GeocodeResult, Geocoder};
use ingest::memory::{InMemoryQueue, InMemoryStore};
use ingest::model::RawEmailMessage;
use ingest::notify::OrderNotifier;
use ingest::queue::MessageQueue;
use ingest::{
    Enqueuer, ExtractionEngine, IntakeOutcome, IntakeService, MessageHandler, Metrics,
    OrderProcessor,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const ORDER_EMAIL: &str = "Order Number: 9001
Requested Vehicle Class: Sprinter Van 12
Pick Up Akron OH 44308 USA 2024-10-11 08:00 EDT (UTC-0400)
Delivery Erie PA 16501 USA 2024-10-11 16:00 EDT (UTC-0400)
Distance: 190 mi
Reply to dispatch@shipper.test with questions
";

struct FixedGeocoder;

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn search(&self, text: &str) -> Result<GeocodeResult, GeocodeError> {
        if text.contains("Akron") {
            Ok(GeocodeResult {
                lat: 41.08,
                lng: -81.52,
                county: Some("Summit County".into()),
                postal_code: Some("44308".into()),
            })
        } else {
            Ok(GeocodeResult {
                lat: 42.13,
                lng: -80.08,
                county: None,
                postal_code: None,
            })
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notified: Mutex<Vec<i64>>,
}

#[async_trait]
impl OrderNotifier for RecordingNotifier {
    async fn notify(&self, order_id: i64) -> Result<(), NotifyError> {
        self.notified.lock().unwrap().push(order_id);
        Ok(())
    }
}

struct Pipeline {
    intake: IntakeService,
    processor: OrderProcessor,
    store: Arc<InMemoryStore>,
    queue: Arc<InMemoryQueue>,
    notifier: Arc<RecordingNotifier>,
}

fn pipeline() -> Pipeline {
    let store = Arc::new(InMemoryStore::new());
    let queue = Arc::new(InMemoryQueue::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let geocoder = Arc::new(FixedGeocoder);

    let intake = IntakeService::new(
        Arc::new(ExtractionEngine::with_default_vendors(geocoder.clone())),
        Enqueuer::new(queue.clone()),
        store.clone(),
        Arc::new(Metrics::new()),
    );
    let processor = OrderProcessor::new(store.clone(), store.clone(), geocoder, notifier.clone());

    Pipeline {
        intake,
        processor,
        store,
        queue,
        notifier,
    }
}

fn email() -> RawEmailMessage {
    RawEmailMessage {
        subject: "Order 9001".into(),
        body_plain: ORDER_EMAIL.into(),
        message_id: "<9001@mail>".into(),
        ..RawEmailMessage::default()
    }
}

#[tokio::test]
async fn email_becomes_a_persisted_order() {
    let p = pipeline();

    let outcome = p.intake.ingest(email()).await.unwrap();
    let IntakeOutcome::Queued { parser_log_id, .. } = outcome else {
        panic!("expected queued, got {outcome:?}");
    };

    let received = p.queue.receive(1, Duration::ZERO).await.unwrap();
    assert_eq!(received.len(), 1);
    p.processor.handle(&received[0].body).await.unwrap();

    let orders = p.store.orders();
    assert_eq!(orders.len(), 1);
    let (order_id, order) = &orders[0];
    assert_eq!(order.parser_log_id, parser_log_id);
    assert_eq!(order.order_number, "9001");
    assert_eq!(order.truck_type_id, 3);
    assert_eq!(order.estimated_miles, 190);
    assert_eq!(order.pickup_zip, "44308");

    let location = p.store.location_for(*order_id).unwrap();
    assert_eq!(location.pickup.coordinates.lat, 41.08);
    assert_eq!(location.pickup.coordinates.county, "Summit County");
    assert_eq!(location.delivery.coordinates.county, "");

    let email = p.store.email_for(*order_id).unwrap();
    assert_eq!(email.reply_to, "dispatch@shipper.test");

    let log = p.store.parser_log(parser_log_id).unwrap();
    assert_eq!(log.order_id, Some(*order_id));
    assert_eq!(log.parser_type, "plain_text");

    assert_eq!(*p.notifier.notified.lock().unwrap(), [*order_id]);
}

#[tokio::test]
async fn redelivered_message_reuses_the_order() {
    let p = pipeline();
    p.intake.ingest(email()).await.unwrap();

    let received = p.queue.receive(1, Duration::ZERO).await.unwrap();
    p.processor.handle(&received[0].body).await.unwrap();
    p.processor.handle(&received[0].body).await.unwrap();

    assert_eq!(p.store.order_count(), 1);
    let notified = p.notifier.notified.lock().unwrap().clone();
    assert_eq!(notified.len(), 2);
    assert_eq!(notified[0], notified[1]);
}
