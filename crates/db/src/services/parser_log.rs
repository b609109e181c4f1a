use async_trait::async_trait;
use ingest::error::RepositoryResult;
use ingest::model::{CompleteParserLog, NewParserLog, ParserLogEntry};
use ingest::repository::ParserLogRepository;
use sqlx::PgPool;
use tracing::debug;

use crate::models::parser_log::ParserLogRow;
use crate::services::error::ServiceError;

const COLUMNS: &str = "id, parser_type, subject, body_html, body_plain, order_id, \
                       error_type, error_text, created_at, updated_at";

#[derive(Clone)]
pub struct PgParserLogStore {
    pool: PgPool,
}

impl PgParserLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParserLogRepository for PgParserLogStore {
    async fn create(&self, log: NewParserLog) -> RepositoryResult<ParserLogEntry> {
        let row = sqlx::query_as::<_, ParserLogRow>(&format!(
            "INSERT INTO parser_logs (parser_type, subject, body_html, body_plain)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        ))
        .bind(&log.parser_type)
        .bind(&log.subject)
        .bind(&log.body_html)
        .bind(&log.body_plain)
        .fetch_one(&self.pool)
        .await
        .map_err(ServiceError::from)?;

        debug!(parser_log_id = row.id, "Parser log created");
        Ok(row.into())
    }

    async fn get(&self, id: i64) -> RepositoryResult<Option<ParserLogEntry>> {
        let row = sqlx::query_as::<_, ParserLogRow>(&format!(
            "SELECT {COLUMNS} FROM parser_logs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ServiceError::from)?;

        Ok(row.map(Into::into))
    }

    async fn mark_failed(
        &self,
        id: i64,
        error_type: &str,
        error_text: &str,
    ) -> RepositoryResult<()> {
        sqlx::query(
            "UPDATE parser_logs
             SET error_type = $2, error_text = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(error_type)
        .bind(error_text)
        .execute(&self.pool)
        .await
        .map_err(ServiceError::from)?;
        Ok(())
    }

    async fn complete(&self, update: CompleteParserLog) -> RepositoryResult<()> {
        sqlx::query(
            "UPDATE parser_logs
             SET parser_type = $2, subject = $3, body_html = $4, body_plain = $5,
                 order_id = $6, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(update.id)
        .bind(&update.parser_type)
        .bind(&update.subject)
        .bind(&update.body_html)
        .bind(&update.body_plain)
        .bind(update.order_id)
        .execute(&self.pool)
        .await
        .map_err(ServiceError::from)?;

        debug!(parser_log_id = update.id, order_id = update.order_id, "Parser log completed");
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        sqlx::query("DELETE FROM parser_logs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(ServiceError::from)?;
        Ok(())
    }
}
