use async_trait::async_trait;
use ingest::memory::InMemoryQueue;
use ingest::queue::MessageQueue;
use ingest::{MessageHandler, Metrics, ProcessError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use worker::{PoolSettings, WorkerPool};

/// Fails each body the configured number of times, then succeeds.
#[derive(Default)]
struct ScriptedHandler {
    failures_left: Mutex<HashMap<String, u32>>,
    attempts: Mutex<Vec<String>>,
    delay: Duration,
}

impl ScriptedHandler {
    fn failing(body: &str, times: u32) -> Self {
        let handler = Self::default();
        handler
            .failures_left
            .lock()
            .unwrap()
            .insert(body.to_string(), times);
        handler
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageHandler for ScriptedHandler {
    async fn handle(&self, body: &str) -> Result<(), ProcessError> {
        self.attempts.lock().unwrap().push(body.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut failures = self.failures_left.lock().unwrap();
        match failures.get_mut(body) {
            Some(left) if *left > 0 => {
                *left -= 1;
                Err(ProcessError::ParserLogNotFound(7))
            }
            _ => Ok(()),
        }
    }
}

fn settings(workers: usize) -> PoolSettings {
    PoolSettings {
        workers,
        channel_capacity: 10,
        batch_size: 10,
        wait_time: Duration::from_millis(20),
        error_backoff: Duration::from_millis(10),
    }
}

async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 5s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn start(
    queue: Arc<InMemoryQueue>,
    handler: Arc<ScriptedHandler>,
    metrics: Arc<Metrics>,
    settings: PoolSettings,
) -> (CancellationToken, tokio::task::JoinHandle<()>) {
    let ctx = CancellationToken::new();
    let pool = WorkerPool::new(queue, handler, metrics, settings);
    let run_ctx = ctx.clone();
    let handle = tokio::spawn(async move { pool.run(run_ctx).await });
    (ctx, handle)
}

#[tokio::test]
async fn processed_messages_are_acknowledged() {
    let queue = Arc::new(InMemoryQueue::new());
    for body in ["a", "b", "c"] {
        queue.send(body.to_string()).await.unwrap();
    }
    let handler = Arc::new(ScriptedHandler::default());
    let metrics = Arc::new(Metrics::new());

    let (ctx, handle) = start(queue.clone(), handler.clone(), metrics.clone(), settings(2));
    wait_until(|| metrics.snapshot().processed == 3).await;
    ctx.cancel();
    handle.await.unwrap();

    assert!(queue.is_empty());
    let mut attempts = handler.attempts();
    attempts.sort();
    assert_eq!(attempts, ["a", "b", "c"]);
    assert_eq!(metrics.snapshot().failed, 0);
}

#[tokio::test]
async fn failed_message_is_redelivered_after_visibility_timeout() {
    let queue = Arc::new(InMemoryQueue::new().with_visibility_timeout(Duration::from_millis(50)));
    queue.send("flaky".to_string()).await.unwrap();
    let handler = Arc::new(ScriptedHandler::failing("flaky", 1));
    let metrics = Arc::new(Metrics::new());

    let (ctx, handle) = start(queue.clone(), handler.clone(), metrics.clone(), settings(1));
    wait_until(|| metrics.snapshot().processed == 1).await;
    ctx.cancel();
    handle.await.unwrap();

    assert_eq!(handler.attempts(), ["flaky", "flaky"]);
    assert_eq!(metrics.snapshot().failed, 1);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn failing_message_stays_queued_until_dead_lettered() {
    let queue = Arc::new(
        InMemoryQueue::new()
            .with_visibility_timeout(Duration::from_millis(20))
            .with_max_receives(2),
    );
    queue.send("poison".to_string()).await.unwrap();
    let handler = Arc::new(ScriptedHandler::failing("poison", u32::MAX));
    let metrics = Arc::new(Metrics::new());

    let (ctx, handle) = start(queue.clone(), handler.clone(), metrics.clone(), settings(1));
    wait_until(|| !queue.dead_letters().is_empty()).await;
    ctx.cancel();
    handle.await.unwrap();

    assert_eq!(queue.dead_letters(), ["poison"]);
    assert_eq!(handler.attempts().len(), 2);
    assert_eq!(metrics.snapshot().failed, 2);
    assert_eq!(metrics.snapshot().processed, 0);
}

#[tokio::test]
async fn shutdown_drains_messages_already_handed_off() {
    let queue = Arc::new(InMemoryQueue::new());
    for i in 0..5 {
        queue.send(format!("m{i}")).await.unwrap();
    }
    let handler = Arc::new(ScriptedHandler::slow(Duration::from_millis(30)));
    let metrics = Arc::new(Metrics::new());

    let (ctx, handle) = start(queue.clone(), handler.clone(), metrics.clone(), settings(1));
    wait_until(|| !handler.attempts().is_empty()).await;
    ctx.cancel();
    handle.await.unwrap();

    assert_eq!(metrics.snapshot().processed, 5);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn idle_pool_stops_on_cancel() {
    let queue = Arc::new(InMemoryQueue::new());
    let handler = Arc::new(ScriptedHandler::default());
    let metrics = Arc::new(Metrics::new());

    let (ctx, handle) = start(queue, handler.clone(), metrics, settings(3));
    tokio::time::sleep(Duration::from_millis(50)).await;
    ctx.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("pool did not stop")
        .unwrap();
    assert!(handler.attempts().is_empty());
}
