//! Per-request log records.
//!
//! Every invocation produces exactly one [`LogRecord`]. The record is created
//! when handling starts, filled in as the pipeline progresses, and handed by
//! value to either [`TelemetryLogger::record_success`] or
//! [`TelemetryLogger::record_failure`]. Taking the record by value means it
//! cannot be flushed twice.

use chrono::{DateTime, Utc};
use gateway_core::Provider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::sinks::{LogSink, TracingSink};

/// Outcome of a logged invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutcome {
    /// Request answered with 200
    Success,
    /// Request answered with 400 or 500
    Failure,
}

impl fmt::Display for LogOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Structured telemetry for one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Correlation ID
    pub request_id: String,
    /// When handling started
    pub request_start_time: DateTime<Utc>,
    /// Resolved provider
    pub provider: Option<Provider>,
    /// Resolved model
    pub model: Option<String>,
    /// Tokens consumed
    pub tokens_used: u32,
    /// Estimated cost (USD)
    pub cost: f64,
    /// Serialized invocation event
    pub raw_request: String,
    /// Serialized backend response (success only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    /// Failure message (failure only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Status code returned to the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Set when the record is flushed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<LogOutcome>,
    /// Milliseconds from start to flush
    #[serde(default)]
    pub duration_ms: u64,
}

impl LogRecord {
    /// Start a record for a new invocation
    #[must_use]
    pub fn start(request_id: impl Into<String>, raw_request: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            request_start_time: Utc::now(),
            provider: None,
            model: None,
            tokens_used: 0,
            cost: 0.0,
            raw_request: raw_request.into(),
            raw_response: None,
            error_message: None,
            status_code: None,
            outcome: None,
            duration_ms: 0,
        }
    }

    /// Record the successful response
    #[must_use]
    pub fn with_response(mut self, raw_response: impl Into<String>, status_code: u16) -> Self {
        self.raw_response = Some(raw_response.into());
        self.status_code = Some(status_code);
        self
    }

    /// Record the failure
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>, status_code: u16) -> Self {
        self.error_message = Some(message.into());
        self.status_code = Some(status_code);
        self
    }

    fn finish(mut self, outcome: LogOutcome) -> Self {
        let elapsed = Utc::now() - self.request_start_time;
        self.duration_ms = elapsed.num_milliseconds().max(0) as u64;
        self.outcome = Some(outcome);
        self
    }
}

/// Appends request log records to a sink.
///
/// Sink failures are reported through `tracing` and otherwise ignored, so they
/// never change the outcome of the request being logged.
#[derive(Clone)]
pub struct TelemetryLogger {
    sink: Arc<dyn LogSink>,
}

impl TelemetryLogger {
    /// Create a logger writing to `sink`
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Logger writing to the `request_log` tracing target
    #[must_use]
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink::new()))
    }

    /// Flush a record for a request that succeeded
    pub async fn record_success(&self, record: LogRecord) {
        self.write(record.finish(LogOutcome::Success)).await;
    }

    /// Flush a record for a request that failed
    pub async fn record_failure(&self, record: LogRecord) {
        self.write(record.finish(LogOutcome::Failure)).await;
    }

    async fn write(&self, record: LogRecord) {
        if let Err(e) = self.sink.append(&record).await {
            warn!(
                sink = self.sink.name(),
                request_id = %record.request_id,
                error = %e,
                "Failed to write request log record"
            );
        }
    }
}

impl Default for TelemetryLogger {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for TelemetryLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryLogger")
            .field("sink", &self.sink.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::{MemorySink, SinkError};
    use async_trait::async_trait;

    struct BrokenSink;

    #[async_trait]
    impl LogSink for BrokenSink {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn append(&self, _record: &LogRecord) -> Result<(), SinkError> {
            Err(SinkError::Io(std::io::Error::other("disk full")))
        }
    }

    #[tokio::test]
    async fn test_record_success_marks_outcome() {
        let sink = Arc::new(MemorySink::new(10));
        let logger = TelemetryLogger::new(sink.clone());

        let record = LogRecord::start("req-1", "{}").with_response(r#"{"text":"hi"}"#, 200);
        logger.record_success(record).await;

        let records = sink.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, Some(LogOutcome::Success));
        assert_eq!(records[0].status_code, Some(200));
        assert!(records[0].error_message.is_none());
    }

    #[tokio::test]
    async fn test_record_failure_keeps_message() {
        let sink = Arc::new(MemorySink::new(10));
        let logger = TelemetryLogger::new(sink.clone());

        logger
            .record_failure(LogRecord::start("req-2", "{}").with_error("rate limited", 500))
            .await;

        let records = sink.records().await;
        assert_eq!(records[0].outcome, Some(LogOutcome::Failure));
        assert_eq!(records[0].error_message.as_deref(), Some("rate limited"));
        assert!(records[0].raw_response.is_none());
    }

    #[tokio::test]
    async fn test_sink_errors_are_swallowed() {
        let logger = TelemetryLogger::new(Arc::new(BrokenSink));
        // Must return normally
        logger
            .record_failure(LogRecord::start("req-3", "{}").with_error("boom", 500))
            .await;
    }

    #[test]
    fn test_new_record_defaults() {
        let record = LogRecord::start("req-4", r#"{"body":"x"}"#);

        assert!(record.provider.is_none());
        assert!(record.model.is_none());
        assert_eq!(record.tokens_used, 0);
        assert!(record.cost.abs() < f64::EPSILON);
        assert!(record.outcome.is_none());
    }

    #[test]
    fn test_record_serialization() {
        let mut record = LogRecord::start("req-5", "{}").with_error("bad", 400);
        record.provider = Some(Provider::OpenAI);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["provider"], "openai");
        assert_eq!(json["error_message"], "bad");
        assert!(json.get("raw_response").is_none());
    }
}
