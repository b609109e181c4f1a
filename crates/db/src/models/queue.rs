use ingest::queue::ReceivedMessage;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct QueueRow {
    pub id: i64,
    pub body: String,
    pub receipt_handle: Uuid,
    pub receive_count: i32,
}

impl From<QueueRow> for ReceivedMessage {
    fn from(row: QueueRow) -> Self {
        ReceivedMessage {
            id: row.id,
            receipt_handle: row.receipt_handle.to_string(),
            body: row.body,
            receive_count: row.receive_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_handle_is_rendered_as_text() {
        let handle = Uuid::new_v4();
        let message: ReceivedMessage = QueueRow {
            id: 3,
            body: "{}".into(),
            receipt_handle: handle,
            receive_count: 2,
        }
        .into();
        assert_eq!(message.receipt_handle, handle.to_string());
        assert_eq!(message.receive_count, 2);
    }
}
