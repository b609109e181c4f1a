//! Freight-order email ingestion: extraction, normalization, queueing and
//! order processing. Storage, queue and HTTP adapters are injected through
//! the traits in [`repository`], [`queue`], [`geocode`] and [`notify`].

pub mod config;
pub mod enqueue;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod geocode;
pub mod intake;
pub mod memory;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod notify;
pub mod process;
pub mod queue;
pub mod repository;
pub mod retry;

pub use enqueue::Enqueuer;
pub use envelope::QueueMessage;
pub use extract::{Extraction, ExtractionEngine};
pub use intake::{IntakeError, IntakeOutcome, IntakeService};
pub use metrics::{Metrics, MetricsSnapshot};
pub use process::{MessageHandler, OrderProcessor, ProcessError};
pub use retry::RetryPolicy;
