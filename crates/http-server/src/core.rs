use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use db::QueueSettings;
use ingest::config::{self, ConfigError};
use ingest::{IntakeError, IntakeService, Metrics, RetryPolicy};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<IntakeService>,
    pub metrics: Arc<Metrics>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub geocoder_url: String,
    pub geocoder_timeout: Duration,
    pub retry: RetryPolicy,
    pub queue: QueueSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let queue_defaults = QueueSettings::default();
        Ok(Self {
            port: config::parse_or("PORT", 3001)?,
            database_url: config::required("DATABASE_URL")?,
            db_max_connections: config::parse_or("DB_MAX_CONNECTIONS", 5)?,
            geocoder_url: config::required("GEOCODER_URL")?,
            geocoder_timeout: config::secs_or("GEOCODER_TIMEOUT_SECS", 10)?,
            retry: config::retry_policy()?,
            queue: QueueSettings {
                visibility_timeout: config::secs_or(
                    "QUEUE_VISIBILITY_TIMEOUT_SECS",
                    queue_defaults.visibility_timeout.as_secs(),
                )?,
                max_receives: config::parse_or("QUEUE_MAX_RECEIVES", queue_defaults.max_receives)?,
                ..queue_defaults
            },
        })
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Malformed request: {0}")]
    MalformedInput(String),

    #[error(transparent)]
    Intake(#[from] IntakeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::MalformedInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Intake(IntakeError::AuditLog(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not record the incoming email.".to_string(),
            ),
            ApiError::Intake(IntakeError::Extraction(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not extract an order from the email.".to_string(),
            ),
            ApiError::Intake(IntakeError::Enqueue(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not queue the order for processing.".to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest::error::ExtractError;

    #[test]
    fn malformed_input_is_a_client_error() {
        let response = ApiError::MalformedInput("bad form".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn intake_failures_are_server_errors() {
        let err = IntakeError::Extraction(ExtractError::MissingBody);
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
