use thiserror::Error;

/// The email body could not be turned into a draft at all.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("email has neither an HTML nor a plain-text body")]
    MissingBody,

    #[error("HTML body could not be parsed: {0}")]
    UnparseableDocument(String),
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("geocoding service answered with status {0}")]
    Status(u16),

    #[error("geocoding response is not a feature collection: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no geocoding features found in the response")]
    NoFeatures,

    #[error("first feature has no usable coordinates")]
    MissingCoordinates,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to serialize queue message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("unknown receipt handle: {0}")]
    UnknownReceipt(String),

    #[error("queue backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notify request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("notify endpoint answered with status {0}")]
    Status(u16),
}
