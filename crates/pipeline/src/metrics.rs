//! Exporter metrics
//!
//! Atomic counters for tracking pipeline progress.
//! All operations use relaxed ordering; values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the export pipeline
///
/// Shared between the decode stage, the writer tasks and the reporter.
#[derive(Debug, Default)]
pub struct ExporterMetrics {
    /// Records produced by the tailer
    records_read: AtomicU64,

    /// Records dropped by the lower date bound
    records_skipped: AtomicU64,

    /// Batches handed to the write queue
    batches_enqueued: AtomicU64,

    /// Batches the sink accepted
    batches_written: AtomicU64,

    /// Records the sink accepted
    records_written: AtomicU64,

    /// Batches the sink rejected
    write_errors: AtomicU64,

    /// Reading timeouts reported by the tailer
    timeouts: AtomicU64,

    /// Times the write queue was full when a batch was ready
    backpressure_events: AtomicU64,

    /// Highest sequence id handed to the write queue
    last_id: AtomicU64,
}

impl ExporterMetrics {
    /// Create new metrics instance with all counters at zero
    #[inline]
    pub const fn new() -> Self {
        Self {
            records_read: AtomicU64::new(0),
            records_skipped: AtomicU64::new(0),
            batches_enqueued: AtomicU64::new(0),
            batches_written: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            backpressure_events: AtomicU64::new(0),
            last_id: AtomicU64::new(0),
        }
    }

    /// Record a record read from the source
    #[inline]
    pub fn record_read(&self) {
        self.records_read.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a record skipped by the date bound
    #[inline]
    pub fn record_skipped(&self) {
        self.records_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch entering the write queue
    #[inline]
    pub fn record_enqueued(&self, last_id: u64) {
        self.batches_enqueued.fetch_add(1, Ordering::Relaxed);
        self.last_id.fetch_max(last_id, Ordering::Relaxed);
    }

    /// Record a batch accepted by the sink
    #[inline]
    pub fn record_written(&self, record_count: u64) {
        self.batches_written.fetch_add(1, Ordering::Relaxed);
        self.records_written
            .fetch_add(record_count, Ordering::Relaxed);
    }

    /// Record a batch rejected by the sink
    #[inline]
    pub fn record_write_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reading timeout
    #[inline]
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a full write queue
    #[inline]
    pub fn record_backpressure(&self) {
        self.backpressure_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    #[inline]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_read: self.records_read.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            batches_enqueued: self.batches_enqueued.load(Ordering::Relaxed),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            backpressure_events: self.backpressure_events.load(Ordering::Relaxed),
            last_id: self.last_id.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of exporter metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Records produced by the tailer
    pub records_read: u64,
    /// Records dropped by the lower date bound
    pub records_skipped: u64,
    /// Batches handed to the write queue
    pub batches_enqueued: u64,
    /// Batches the sink accepted
    pub batches_written: u64,
    /// Records the sink accepted
    pub records_written: u64,
    /// Batches the sink rejected
    pub write_errors: u64,
    /// Reading timeouts
    pub timeouts: u64,
    /// Full write queue events
    pub backpressure_events: u64,
    /// Highest sequence id enqueued
    pub last_id: u64,
}

impl MetricsSnapshot {
    /// Batches enqueued but not yet written
    #[inline]
    pub fn batches_in_flight(&self) -> u64 {
        self.batches_enqueued
            .saturating_sub(self.batches_written + self.write_errors)
    }
}
