use async_trait::async_trait;
use ingest::error::QueueError;
use ingest::queue::{MessageQueue, ReceivedMessage};
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::queue::QueueRow;
use crate::services::error::ServiceError;

#[derive(Debug, Clone, Copy)]
pub struct QueueSettings {
    /// How long a received message stays hidden before it is redelivered.
    pub visibility_timeout: Duration,
    /// Deliveries after which a message moves to `queue_dead_letters`.
    pub max_receives: i32,
    /// Sleep between empty polls while long-polling.
    pub poll_interval: Duration,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(60),
            max_receives: 5,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// At-least-once queue on a Postgres table. Receivers claim rows with
/// `FOR UPDATE SKIP LOCKED` and push their visibility forward.
#[derive(Clone)]
pub struct PgMessageQueue {
    pool: PgPool,
    settings: QueueSettings,
}

impl PgMessageQueue {
    pub fn new(pool: PgPool, settings: QueueSettings) -> Self {
        Self { pool, settings }
    }

    async fn dead_letter(&self) -> Result<u64, ServiceError> {
        let moved = sqlx::query(
            r#"
            WITH dead AS (
                DELETE FROM queue_messages
                WHERE visible_at <= NOW() AND receive_count >= $1
                RETURNING id, body, receive_count, created_at
            )
            INSERT INTO queue_dead_letters (id, body, receive_count, created_at)
            SELECT id, body, receive_count, created_at FROM dead
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(self.settings.max_receives)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(moved)
    }

    async fn claim(&self, max_messages: usize) -> Result<Vec<QueueRow>, ServiceError> {
        let limit = i64::try_from(max_messages).unwrap_or(i64::MAX);
        let visibility_secs = self.settings.visibility_timeout.as_secs_f64();
        let rows = sqlx::query_as::<_, QueueRow>(
            r#"
            WITH ready AS (
                SELECT id FROM queue_messages
                WHERE visible_at <= NOW()
                ORDER BY id
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE queue_messages q
            SET receipt_handle = gen_random_uuid(),
                receive_count = q.receive_count + 1,
                visible_at = NOW() + ($2 * INTERVAL '1 second')
            FROM ready
            WHERE q.id = ready.id
            RETURNING q.id, q.body, q.receipt_handle, q.receive_count
            "#,
        )
        .bind(limit)
        .bind(visibility_secs)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl MessageQueue for PgMessageQueue {
    async fn send(&self, body: String) -> Result<(), QueueError> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO queue_messages (body) VALUES ($1) RETURNING id")
                .bind(&body)
                .fetch_one(&self.pool)
                .await
                .map_err(ServiceError::from)?;
        debug!(queue_message_id = id, "Message sent");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let deadline = Instant::now() + wait;
        loop {
            let moved = self.dead_letter().await?;
            if moved > 0 {
                warn!(count = moved, "Moved messages to the dead-letter table");
            }

            let rows = self.claim(max_messages).await?;
            let now = Instant::now();
            if !rows.is_empty() || now >= deadline {
                return Ok(rows.into_iter().map(Into::into).collect());
            }
            tokio::time::sleep(self.settings.poll_interval.min(deadline - now)).await;
        }
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let handle = Uuid::parse_str(receipt_handle)
            .map_err(|_| ServiceError::InvalidReceipt(receipt_handle.to_string()))?;
        let deleted = sqlx::query("DELETE FROM queue_messages WHERE receipt_handle = $1")
            .bind(handle)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::from)?
            .rows_affected();
        if deleted == 0 {
            return Err(ServiceError::InvalidReceipt(receipt_handle.to_string()).into());
        }
        Ok(())
    }
}
