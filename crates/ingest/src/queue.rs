use async_trait::async_trait;
use std::time::Duration;

use crate::error::QueueError;

/// A message handed out by [`MessageQueue::receive`]. It stays invisible to
/// other consumers until the visibility timeout lapses or it is deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub id: i64,
    pub receipt_handle: String,
    pub body: String,
    /// How many times this message has been handed out, this delivery included.
    pub receive_count: i32,
}

/// Durable at-least-once queue. No ordering guarantee.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn send(&self, body: String) -> Result<(), QueueError>;

    /// Long-polls for up to `max_messages`, waiting at most `wait` when the
    /// queue is empty.
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;

    /// Acknowledges a message. Only the latest receipt handle is valid.
    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError>;
}
