//! In-process adapters with the same contracts as the Postgres ones.
//! Used by tests and local runs without a database.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::{QueueError, RepositoryError, RepositoryResult};
use crate::model::{
    CompleteParserLog, NewOrder, NewOrderEmail, NewOrderItem, NewOrderLocation, NewParserLog,
    ParserLogEntry,
};
use crate::queue::{MessageQueue, ReceivedMessage};
use crate::repository::{OrderRepository, ParserLogRepository};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct QueuedMessage {
    id: i64,
    body: String,
    receipt_handle: Option<String>,
    visible_at: Instant,
    receive_count: i32,
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: i64,
    messages: Vec<QueuedMessage>,
    dead_letters: Vec<String>,
}

/// Queue with visibility timeouts and an optional dead-letter limit.
#[derive(Debug)]
pub struct InMemoryQueue {
    state: Mutex<QueueState>,
    visibility_timeout: Duration,
    max_receives: Option<i32>,
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            visibility_timeout: Duration::from_secs(30),
            max_receives: None,
        }
    }

    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    /// Messages already received this many times move to the dead-letter
    /// list instead of being handed out again.
    pub fn with_max_receives(mut self, max_receives: i32) -> Self {
        self.max_receives = Some(max_receives);
        self
    }

    /// Messages not yet deleted, in flight or not.
    pub fn len(&self) -> usize {
        lock(&self.state).messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dead_letters(&self) -> Vec<String> {
        lock(&self.state).dead_letters.clone()
    }

    fn take_visible(&self, max_messages: usize) -> Vec<ReceivedMessage> {
        let now = Instant::now();
        let mut state = lock(&self.state);

        if let Some(max_receives) = self.max_receives {
            let (dead, live): (Vec<_>, Vec<_>) = std::mem::take(&mut state.messages)
                .into_iter()
                .partition(|m| m.visible_at <= now && m.receive_count >= max_receives);
            state.messages = live;
            state.dead_letters.extend(dead.into_iter().map(|m| m.body));
        }

        state
            .messages
            .iter_mut()
            .filter(|m| m.visible_at <= now)
            .take(max_messages)
            .map(|m| {
                let receipt_handle = Uuid::new_v4().to_string();
                m.receipt_handle = Some(receipt_handle.clone());
                m.receive_count += 1;
                m.visible_at = now + self.visibility_timeout;
                ReceivedMessage {
                    id: m.id,
                    receipt_handle,
                    body: m.body.clone(),
                    receive_count: m.receive_count,
                }
            })
            .collect()
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn send(&self, body: String) -> Result<(), QueueError> {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = state.next_id;
        state.messages.push(QueuedMessage {
            id,
            body,
            receipt_handle: None,
            visible_at: Instant::now(),
            receive_count: 0,
        });
        Ok(())
    }

    async fn receive(
        &self,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let deadline = Instant::now() + wait;
        loop {
            let messages = self.take_visible(max_messages);
            let now = Instant::now();
            if !messages.is_empty() || now >= deadline {
                return Ok(messages);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let mut state = lock(&self.state);
        let position = state
            .messages
            .iter()
            .position(|m| m.receipt_handle.as_deref() == Some(receipt_handle))
            .ok_or_else(|| QueueError::UnknownReceipt(receipt_handle.to_string()))?;
        state.messages.remove(position);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct StoreState {
    sequence: i64,
    parser_logs: BTreeMap<i64, ParserLogEntry>,
    orders: BTreeMap<i64, NewOrder>,
    locations: BTreeMap<i64, NewOrderLocation>,
    items: BTreeMap<i64, NewOrderItem>,
    emails: BTreeMap<i64, NewOrderEmail>,
}

impl StoreState {
    fn next_id(&mut self) -> i64 {
        self.sequence += 1;
        self.sequence
    }
}

/// Parser logs and orders kept in memory. Order rows are unique per parser
/// log and child rows unique per order, like the database schema.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parser_log(&self, id: i64) -> Option<ParserLogEntry> {
        lock(&self.state).parser_logs.get(&id).cloned()
    }

    pub fn parser_logs(&self) -> Vec<ParserLogEntry> {
        lock(&self.state).parser_logs.values().cloned().collect()
    }

    pub fn parser_log_count(&self) -> usize {
        lock(&self.state).parser_logs.len()
    }

    pub fn orders(&self) -> Vec<(i64, NewOrder)> {
        lock(&self.state)
            .orders
            .iter()
            .map(|(id, order)| (*id, order.clone()))
            .collect()
    }

    pub fn order_count(&self) -> usize {
        lock(&self.state).orders.len()
    }

    pub fn location_for(&self, order_id: i64) -> Option<NewOrderLocation> {
        lock(&self.state).locations.get(&order_id).cloned()
    }

    pub fn item_for(&self, order_id: i64) -> Option<NewOrderItem> {
        lock(&self.state).items.get(&order_id).cloned()
    }

    pub fn email_for(&self, order_id: i64) -> Option<NewOrderEmail> {
        lock(&self.state).emails.get(&order_id).cloned()
    }
}

fn not_found(what: &str, id: i64) -> RepositoryError {
    RepositoryError::NotFound(format!("{what} {id}"))
}

#[async_trait]
impl ParserLogRepository for InMemoryStore {
    async fn create(&self, log: NewParserLog) -> RepositoryResult<ParserLogEntry> {
        let mut state = lock(&self.state);
        let now = Utc::now();
        let entry = ParserLogEntry {
            id: state.next_id(),
            parser_type: log.parser_type,
            body_html: log.body_html,
            body_plain: log.body_plain,
            subject: log.subject,
            order_id: None,
            error_type: None,
            error_text: None,
            created_at: now,
            updated_at: now,
        };
        state.parser_logs.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn get(&self, id: i64) -> RepositoryResult<Option<ParserLogEntry>> {
        Ok(self.parser_log(id))
    }

    async fn mark_failed(
        &self,
        id: i64,
        error_type: &str,
        error_text: &str,
    ) -> RepositoryResult<()> {
        let mut state = lock(&self.state);
        let entry = state
            .parser_logs
            .get_mut(&id)
            .ok_or_else(|| not_found("parser log", id))?;
        entry.error_type = Some(error_type.to_string());
        entry.error_text = Some(error_text.to_string());
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn complete(&self, update: CompleteParserLog) -> RepositoryResult<()> {
        let mut state = lock(&self.state);
        let entry = state
            .parser_logs
            .get_mut(&update.id)
            .ok_or_else(|| not_found("parser log", update.id))?;
        entry.parser_type = update.parser_type;
        entry.subject = update.subject;
        entry.body_html = update.body_html;
        entry.body_plain = update.body_plain;
        entry.order_id = Some(update.order_id);
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        lock(&self.state).parser_logs.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create_order(&self, order: NewOrder) -> RepositoryResult<i64> {
        let mut state = lock(&self.state);
        let existing = state
            .orders
            .iter()
            .find(|(_, o)| o.parser_log_id == order.parser_log_id)
            .map(|(id, _)| *id);
        let id = match existing {
            Some(id) => id,
            None => state.next_id(),
        };
        state.orders.insert(id, order);
        Ok(id)
    }

    async fn create_order_location(&self, location: NewOrderLocation) -> RepositoryResult<i64> {
        let mut state = lock(&self.state);
        if !state.orders.contains_key(&location.order_id) {
            return Err(not_found("order", location.order_id));
        }
        let order_id = location.order_id;
        state.locations.insert(order_id, location);
        Ok(order_id)
    }

    async fn create_order_item(&self, item: NewOrderItem) -> RepositoryResult<i64> {
        let mut state = lock(&self.state);
        if !state.orders.contains_key(&item.order_id) {
            return Err(not_found("order", item.order_id));
        }
        let order_id = item.order_id;
        state.items.insert(order_id, item);
        Ok(order_id)
    }

    async fn create_order_email(&self, email: NewOrderEmail) -> RepositoryResult<i64> {
        let mut state = lock(&self.state);
        if !state.orders.contains_key(&email.order_id) {
            return Err(not_found("order", email.order_id));
        }
        let order_id = email.order_id;
        state.emails.insert(order_id, email);
        Ok(order_id)
    }
}
