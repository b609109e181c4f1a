use chrono::{DateTime, Utc};
use ingest::model::ParserLogEntry;
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct ParserLogRow {
    pub id: i64,
    pub parser_type: String,
    pub subject: String,
    pub body_html: String,
    pub body_plain: String,
    pub order_id: Option<i64>,
    pub error_type: Option<String>,
    pub error_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ParserLogRow> for ParserLogEntry {
    fn from(row: ParserLogRow) -> Self {
        ParserLogEntry {
            id: row.id,
            parser_type: row.parser_type,
            body_html: row.body_html,
            body_plain: row.body_plain,
            subject: row.subject,
            order_id: row.order_id,
            error_type: row.error_type,
            error_text: row.error_text,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
