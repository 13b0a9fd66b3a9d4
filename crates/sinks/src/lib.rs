//! Evlog - Sinks
//!
//! Destinations for decoded audit log records. Every sink owns its
//! checkpoint: the exporter asks it where to resume and only ever learns
//! about progress through what the sink has durably stored.
//!
//! # Architecture
//!
//! ```text
//! [Exporter] --Vec<EventRecord>--> [Writer workers] --write()--> [EventSink] --> [Destination]
//!      ^                                                              |
//!      +--------------------------- read_position() -----------------+
//! ```
//!
//! # Available Sinks
//!
//! | Sink | Purpose | Position survives restart |
//! |------|---------|---------------------------|
//! | `null` | Benchmarking (discard all) | No |
//! | `stdout` | Debug output | No |
//! | `disk_plaintext` | Human-readable logs | Yes (sidecar file) |
//! | `clickhouse` | Analytics database | Yes (newest row) |
//!
//! # Example
//!
//! ```ignore
//! use evlog_sinks::{EventSink, NullSink};
//!
//! let sink = NullSink::new();
//! let resume_from = sink.read_position().await?;
//! sink.write(&batch).await?;
//! ```

// =============================================================================
// Sink implementations (each in its own submodule)
// =============================================================================

/// Null sink - discards all data (for benchmarking)
pub mod null;

/// Stdout sink - human-readable debug output
pub mod stdout;

/// Disk plaintext sink - human-readable text logs with a position sidecar
pub mod disk_plaintext;

/// ClickHouse sink - analytics database
pub mod clickhouse;

/// Common types shared by all sinks (trait, errors, metrics)
mod common;

// =============================================================================
// Public re-exports
// =============================================================================

pub use common::{EventSink, MetricsSnapshot, SinkError, SinkMetrics};

// Re-export main sink types for convenience
pub use clickhouse::{ClickHouseConfig, ClickHouseSink};
pub use disk_plaintext::{DiskPlaintextConfig, DiskPlaintextSink};
pub use null::{NullSink, NullSinkConfig};
pub use stdout::{OutputFormat, StdoutConfig, StdoutSink};

