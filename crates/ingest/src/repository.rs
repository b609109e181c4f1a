use async_trait::async_trait;

use crate::error::RepositoryResult;
use crate::model::{
    CompleteParserLog, NewOrder, NewOrderEmail, NewOrderItem, NewOrderLocation, NewParserLog,
    ParserLogEntry,
};

/// Audit trail of ingestion attempts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParserLogRepository: Send + Sync {
    async fn create(&self, log: NewParserLog) -> RepositoryResult<ParserLogEntry>;

    /// `None` when no row has this id.
    async fn get(&self, id: i64) -> RepositoryResult<Option<ParserLogEntry>>;

    async fn mark_failed(&self, id: i64, error_type: &str, error_text: &str)
        -> RepositoryResult<()>;

    async fn complete(&self, update: CompleteParserLog) -> RepositoryResult<()>;

    async fn delete(&self, id: i64) -> RepositoryResult<()>;
}

/// Order persistence. Every create is keyed so that repeating it for the
/// same parser log or order returns the existing row id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: NewOrder) -> RepositoryResult<i64>;

    async fn create_order_location(&self, location: NewOrderLocation) -> RepositoryResult<i64>;

    async fn create_order_item(&self, item: NewOrderItem) -> RepositoryResult<i64>;

    async fn create_order_email(&self, email: NewOrderEmail) -> RepositoryResult<i64>;
}
