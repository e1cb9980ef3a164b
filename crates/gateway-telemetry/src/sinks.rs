//! Destinations for request log records.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::request_log::{LogOutcome, LogRecord};

/// Append-only destination for [`LogRecord`]s
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Short sink name used in diagnostics
    fn name(&self) -> &'static str;

    /// Append one record
    async fn append(&self, record: &LogRecord) -> Result<(), SinkError>;
}

/// Sink write error
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Record could not be serialized
    #[error("Failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
    /// Underlying I/O failed
    #[error("Failed to write log record: {0}")]
    Io(#[from] std::io::Error),
}

/// Emits each record as a JSON event on the `request_log` tracing target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Create a tracing sink
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LogSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    async fn append(&self, record: &LogRecord) -> Result<(), SinkError> {
        let json = serde_json::to_string(record)?;
        let provider = record.provider.map_or("none", |p| p.as_str());

        match record.outcome {
            Some(LogOutcome::Failure) => warn!(
                target: "request_log",
                request_id = %record.request_id,
                provider,
                status = record.status_code,
                "{}",
                json
            ),
            _ => info!(
                target: "request_log",
                request_id = %record.request_id,
                provider,
                status = record.status_code,
                "{}",
                json
            ),
        }
        Ok(())
    }
}

/// Bounded in-memory buffer of recent records.
///
/// Oldest records are dropped once `capacity` is reached.
#[derive(Debug)]
pub struct MemorySink {
    capacity: usize,
    records: RwLock<VecDeque<LogRecord>>,
}

impl MemorySink {
    /// Create a buffer holding at most `capacity` records
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: RwLock::new(VecDeque::new()),
        }
    }

    /// Buffered records, oldest first
    pub async fn records(&self) -> Vec<LogRecord> {
        self.records.read().await.iter().cloned().collect()
    }

    /// Number of buffered records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the buffer is empty
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn append(&self, record: &LogRecord) -> Result<(), SinkError> {
        let mut records = self.records.write().await;
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(())
    }
}

/// Appends records as JSON Lines to a file
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    // Serializes appends so lines from concurrent requests never interleave
    lock: Mutex<()>,
}

impl JsonLinesSink {
    /// Create a sink appending to `path`; the file is created on first write
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Target file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSink for JsonLinesSink {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn append(&self, record: &LogRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sink_drops_oldest() {
        let sink = MemorySink::new(3);
        for i in 0..5 {
            sink.append(&LogRecord::start(format!("req-{i}"), "{}"))
                .await
                .unwrap();
        }

        let records = sink.records().await;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].request_id, "req-2");
        assert_eq!(records[2].request_id, "req-4");
    }

    #[tokio::test]
    async fn test_memory_sink_is_empty() {
        let sink = MemorySink::new(10);
        assert!(sink.is_empty().await);

        sink.append(&LogRecord::start("a", "{}")).await.unwrap();
        assert!(!sink.is_empty().await);
        assert_eq!(sink.len().await, 1);
    }

    #[tokio::test]
    async fn test_json_lines_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requests.jsonl");
        let sink = JsonLinesSink::new(&path);

        sink.append(&LogRecord::start("req-1", "{}")).await.unwrap();
        sink.append(&LogRecord::start("req-2", "{}").with_error("boom", 500))
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: LogRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.request_id, "req-2");
        assert_eq!(second.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_json_lines_sink_reports_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        let sink = JsonLinesSink::new(dir.path());

        let result = sink.append(&LogRecord::start("req-1", "{}")).await;
        assert!(matches!(result, Err(SinkError::Io(_))));
    }

    #[tokio::test]
    async fn test_tracing_sink_accepts_records() {
        let sink = TracingSink::new();
        assert!(sink.append(&LogRecord::start("req-1", "{}")).await.is_ok());
    }
}
