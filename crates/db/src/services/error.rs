use ingest::error::{QueueError, RepositoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid receipt handle: {0}")]
    InvalidReceipt(String),
}

impl From<ServiceError> for RepositoryError {
    fn from(e: ServiceError) -> Self {
        RepositoryError::Storage(e.into())
    }
}

impl From<ServiceError> for QueueError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::InvalidReceipt(handle) => QueueError::UnknownReceipt(handle),
            other => QueueError::Backend(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_receipt_maps_to_unknown_receipt() {
        let err: QueueError = ServiceError::InvalidReceipt("nope".into()).into();
        assert!(matches!(err, QueueError::UnknownReceipt(handle) if handle == "nope"));
    }

    #[test]
    fn database_errors_are_storage_errors() {
        let err: RepositoryError = ServiceError::DatabaseError(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, RepositoryError::Storage(_)));
    }
}
