//! Common types and utilities for sinks
//!
//! The sink contract, shared metrics and errors.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use evlog_protocol::{Checkpoint, EventRecord};
use thiserror::Error;

use crate::clickhouse::ClickHouseSinkError;

/// Durable destination for decoded records
///
/// Implementations own the checkpoint: the position they report must only
/// ever reflect batches they have durably accepted.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &str;

    /// Position right after the last durably written record, if any
    async fn read_position(&self) -> Result<Option<Checkpoint>, SinkError>;

    /// Write a batch atomically: either every record is stored or none is
    async fn write(&self, batch: &[EventRecord]) -> Result<(), SinkError>;

    /// Counters for this sink
    fn metrics(&self) -> &SinkMetrics;
}

/// Metrics shared by all sink types
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Total batches handed to the sink
    pub batches_received: AtomicU64,

    /// Total batches successfully written
    pub batches_written: AtomicU64,

    /// Total records written
    pub records_written: AtomicU64,

    /// Total bytes written (sinks that know it)
    pub bytes_written: AtomicU64,

    /// Write errors encountered
    pub write_errors: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            batches_received: AtomicU64::new(0),
            batches_written: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Record a received batch
    #[inline]
    pub fn batch_received(&self) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successfully written batch
    #[inline]
    pub fn batch_written(&self, record_count: u64, bytes: u64) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.records_written
            .fetch_add(record_count, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a write error
    #[inline]
    pub fn write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_received: self.batches_received.load(Ordering::Relaxed),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_received: u64,
    pub batches_written: u64,
    pub records_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
}

/// Common sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink initialization failed
    #[error("failed to initialize sink: {0}")]
    Init(String),

    /// Failed to write data
    #[error("write failed: {0}")]
    Write(String),

    /// Failed to read the stored position
    #[error("failed to read position: {0}")]
    Position(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// ClickHouse backend error
    #[error(transparent)]
    ClickHouse(#[from] ClickHouseSinkError),
}

impl SinkError {
    /// Create an initialization error
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create a position error
    pub fn position(msg: impl Into<String>) -> Self {
        Self::Position(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
