//! # Gateway Telemetry
//!
//! Observability and telemetry for the prompt gateway.
//!
//! This crate provides:
//! - Structured logging initialisation
//! - Per-request log records and the sinks they are appended to
//! - Cost estimation from token usage
//! - Prometheus metrics for monitoring

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cost;
pub mod logging;
pub mod metrics;
pub mod request_log;
pub mod sinks;

// Re-export main types
pub use cost::{ModelPricing, PricingTable};
pub use logging::{init_logging, LoggingConfig, LoggingError};
pub use metrics::{Metrics, MetricsError};
pub use request_log::{LogOutcome, LogRecord, TelemetryLogger};
pub use sinks::{JsonLinesSink, LogSink, MemorySink, SinkError, TracingSink};
