pub mod metrics;
pub mod webhook;
