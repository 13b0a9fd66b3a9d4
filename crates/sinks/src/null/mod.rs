//! Null sink - discards all records
//!
//! Accepts every batch, updates metrics and remembers the position of the
//! last record in memory. Nothing survives a restart, so every run starts
//! from the beginning of the log.
//!
//! # Use Cases
//!
//! - **Benchmarking**: Measure decode throughput without sink bottlenecks
//! - **Testing**: Validate a log directory decodes end to end
//!
//! # Example
//!
//! ```ignore
//! use evlog_sinks::{EventSink, NullSink};
//!
//! let sink = NullSink::new();
//! sink.write(&batch).await?;
//! assert_eq!(sink.read_position().await?, batch.last().map(|r| r.checkpoint()));
//! ```

use async_trait::async_trait;
use evlog_protocol::{Checkpoint, EventRecord};
use parking_lot::Mutex;

use crate::{EventSink, SinkError, SinkMetrics};

/// Configuration for null sink
#[derive(Debug, Clone)]
pub struct NullSinkConfig {
    /// Sink identifier
    pub id: String,
}

impl Default for NullSinkConfig {
    fn default() -> Self {
        Self { id: "null".into() }
    }
}

/// Sink that discards records and keeps the last position in memory
#[derive(Debug, Default)]
pub struct NullSink {
    config: NullSinkConfig,
    position: Mutex<Option<Checkpoint>>,
    metrics: SinkMetrics,
}

impl NullSink {
    /// Create a new null sink
    pub fn new() -> Self {
        Self::with_config(NullSinkConfig::default())
    }

    /// Create a new null sink with full configuration
    pub fn with_config(config: NullSinkConfig) -> Self {
        Self {
            config,
            position: Mutex::new(None),
            metrics: SinkMetrics::new(),
        }
    }

    /// Start as if records up to `checkpoint` had already been written
    #[must_use]
    pub fn with_position(self, checkpoint: Checkpoint) -> Self {
        *self.position.lock() = Some(checkpoint);
        self
    }
}

#[async_trait]
impl EventSink for NullSink {
    fn name(&self) -> &str {
        &self.config.id
    }

    async fn read_position(&self) -> Result<Option<Checkpoint>, SinkError> {
        Ok(self.position.lock().clone())
    }

    async fn write(&self, batch: &[EventRecord]) -> Result<(), SinkError> {
        self.metrics.batch_received();
        if let Some(last) = batch.last() {
            *self.position.lock() = Some(last.checkpoint());
        }
        self.metrics.batch_written(batch.len() as u64, 0);
        Ok(())
    }

    fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }
}
