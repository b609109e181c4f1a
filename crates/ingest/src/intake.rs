//! Webhook-side pipeline: audit log, extraction, enqueue.

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::enqueue::Enqueuer;
use crate::error::{ExtractError, QueueError, RepositoryError};
use crate::extract::{Extraction, ExtractionEngine};
use crate::metrics::Metrics;
use crate::model::{NewParserLog, RawEmailMessage};
use crate::repository::ParserLogRepository;

pub const ERROR_MISSING_REQUIRED_FIELD: &str = "missing_required_field";
pub const ERROR_EXTRACTION_FAILURE: &str = "extraction_failure";
pub const ERROR_ENQUEUE_FAILURE: &str = "enqueue_failure";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Queued {
        parser_log_id: i64,
        order_number: String,
    },
    /// Dropped or rejected on purpose. Not an error for the sender.
    Ignored { reason: String },
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("failed to record parser log: {0}")]
    AuditLog(#[source] RepositoryError),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error(transparent)]
    Enqueue(#[from] QueueError),
}

pub struct IntakeService {
    engine: Arc<ExtractionEngine>,
    enqueuer: Enqueuer,
    parser_logs: Arc<dyn ParserLogRepository>,
    metrics: Arc<Metrics>,
}

impl IntakeService {
    pub fn new(
        engine: Arc<ExtractionEngine>,
        enqueuer: Enqueuer,
        parser_logs: Arc<dyn ParserLogRepository>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            engine,
            enqueuer,
            parser_logs,
            metrics,
        }
    }

    #[instrument(skip_all, fields(message_id = %raw.message_id, subject = %raw.subject))]
    pub async fn ingest(&self, raw: RawEmailMessage) -> Result<IntakeOutcome, IntakeError> {
        self.metrics.record_received();

        let log = self
            .parser_logs
            .create(NewParserLog {
                parser_type: self.engine.source_name(&raw),
                subject: raw.subject.clone(),
                body_html: raw.body_html.clone(),
                body_plain: raw.body_plain.clone(),
            })
            .await
            .map_err(IntakeError::AuditLog)?;

        match self.engine.extract(&raw).await {
            Ok(Extraction::Accepted(order)) => {
                if let Err(e) = self.enqueuer.enqueue(&order, log.id).await {
                    error!(parser_log_id = log.id, error = %e, "Failed to enqueue order");
                    self.mark_failed(log.id, ERROR_ENQUEUE_FAILURE, &e.to_string()).await;
                    return Err(e.into());
                }
                self.metrics.record_enqueued();
                Ok(IntakeOutcome::Queued {
                    parser_log_id: log.id,
                    order_number: order.order_number,
                })
            }
            Ok(Extraction::Dropped(reason)) => {
                info!(parser_log_id = log.id, %reason, "Dropping email");
                self.metrics.record_dropped();
                self.mark_failed(log.id, ERROR_MISSING_REQUIRED_FIELD, &reason.to_string())
                    .await;
                Ok(IntakeOutcome::Ignored {
                    reason: reason.to_string(),
                })
            }
            Ok(Extraction::Rejected(reason)) => {
                info!(parser_log_id = log.id, %reason, "Rejecting email");
                self.metrics.record_rejected();
                if let Err(e) = self.parser_logs.delete(log.id).await {
                    warn!(parser_log_id = log.id, error = %e, "Failed to delete parser log");
                }
                Ok(IntakeOutcome::Ignored {
                    reason: reason.to_string(),
                })
            }
            Err(e) => {
                error!(parser_log_id = log.id, error = %e, "Extraction failed");
                self.metrics.record_extraction_failed();
                self.mark_failed(log.id, ERROR_EXTRACTION_FAILURE, &e.to_string()).await;
                Err(e.into())
            }
        }
    }

    async fn mark_failed(&self, id: i64, error_type: &str, error_text: &str) {
        if let Err(e) = self.parser_logs.mark_failed(id, error_type, error_text).await {
            warn!(parser_log_id = id, error = %e, "Failed to record parser log error");
        }
    }
}
