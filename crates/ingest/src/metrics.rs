use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-local pipeline counters.
#[derive(Debug, Default)]
pub struct Metrics {
    received: AtomicU64,
    enqueued: AtomicU64,
    dropped: AtomicU64,
    rejected: AtomicU64,
    extraction_failed: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub received: u64,
    pub enqueued: u64,
    pub dropped: u64,
    pub rejected: u64,
    pub extraction_failed: u64,
    pub processed: u64,
    pub failed: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_extraction_failed(&self) {
        self.extraction_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            extraction_failed: self.extraction_failed.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
