use ingest::queue::{MessageQueue, ReceivedMessage};
use ingest::{MessageHandler, Metrics};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub workers: usize,
    pub channel_capacity: usize,
    pub batch_size: usize,
    /// Long-poll wait per receive call.
    pub wait_time: Duration,
    /// Pause after a failed receive.
    pub error_backoff: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            workers: 10,
            channel_capacity: 10,
            batch_size: 10,
            wait_time: Duration::from_secs(20),
            error_backoff: Duration::from_secs(1),
        }
    }
}

type SharedReceiver = Arc<Mutex<mpsc::Receiver<ReceivedMessage>>>;

pub struct WorkerPool {
    queue: Arc<dyn MessageQueue>,
    handler: Arc<dyn MessageHandler>,
    metrics: Arc<Metrics>,
    settings: PoolSettings,
}

impl WorkerPool {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        handler: Arc<dyn MessageHandler>,
        metrics: Arc<Metrics>,
        settings: PoolSettings,
    ) -> Self {
        Self {
            queue,
            handler,
            metrics,
            settings,
        }
    }

    /// Runs until `ctx` is cancelled. Messages already handed to the channel
    /// are still processed before this returns.
    pub async fn run(&self, ctx: CancellationToken) {
        let workers = self.settings.workers.max(1);
        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(1));
        let rx: SharedReceiver = Arc::new(Mutex::new(rx));

        let mut tasks = JoinSet::new();
        for worker_id in 0..workers {
            tasks.spawn(work(
                worker_id,
                Arc::clone(&rx),
                Arc::clone(&self.queue),
                Arc::clone(&self.handler),
                Arc::clone(&self.metrics),
            ));
        }
        info!(workers, "Worker pool started");

        self.poll(tx, &ctx).await;

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Worker task panicked");
            }
        }
        info!("Worker pool stopped gracefully");
    }

    async fn poll(&self, tx: mpsc::Sender<ReceivedMessage>, ctx: &CancellationToken) {
        loop {
            let received = tokio::select! {
                _ = ctx.cancelled() => {
                    info!("Received shutdown signal, stopping poller");
                    break;
                }
                result = self
                    .queue
                    .receive(self.settings.batch_size, self.settings.wait_time) => result,
            };

            match received {
                Ok(messages) => {
                    if !messages.is_empty() {
                        debug!(message_count = messages.len(), "Received message batch");
                    }
                    for message in messages {
                        // Blocks while every worker is busy and the channel is full.
                        if tx.send(message).await.is_err() {
                            warn!("All workers exited, stopping poller");
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to receive messages");
                    tokio::select! {
                        _ = ctx.cancelled() => break,
                        _ = tokio::time::sleep(self.settings.error_backoff) => {}
                    }
                }
            }
        }
    }
}

async fn work(
    worker_id: usize,
    rx: SharedReceiver,
    queue: Arc<dyn MessageQueue>,
    handler: Arc<dyn MessageHandler>,
    metrics: Arc<Metrics>,
) {
    loop {
        let next = rx.lock().await.recv().await;
        let Some(message) = next else {
            debug!(worker_id, "Channel closed, worker exiting");
            return;
        };
        handle_message(worker_id, &message, queue.as_ref(), handler.as_ref(), &metrics).await;
    }
}

/// Acknowledges only on success. Failed messages stay on the queue and come
/// back once their visibility timeout lapses.
#[instrument(
    skip_all,
    fields(worker_id = worker_id, message_id = message.id, receive_count = message.receive_count)
)]
async fn handle_message(
    worker_id: usize,
    message: &ReceivedMessage,
    queue: &dyn MessageQueue,
    handler: &dyn MessageHandler,
    metrics: &Metrics,
) {
    match handler.handle(&message.body).await {
        Ok(()) => {
            metrics.record_processed();
            if let Err(e) = queue.delete(&message.receipt_handle).await {
                warn!(error = %e, "Processed message could not be acknowledged");
            }
        }
        Err(e) => {
            metrics.record_failed();
            error!(error = %e, "Failed to process message");
        }
    }
}
