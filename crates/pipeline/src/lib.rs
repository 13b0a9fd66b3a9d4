//! Evlog - Pipeline
//!
//! The export pipeline: a single decode stage feeding a bounded queue of
//! batches that a pool of writers drains into one sink.
//!
//! # Architecture
//!
//! ```text
//!                     [Decode stage]                         [Write stage]
//! 1Cv8.lgf ──┐                                         ┌──→ writer 0 ──┐
//!            ├──→ Tailer ──→ ids ──→ batch (P) ──→ mpsc(C) ──→ ...     ├──→ EventSink
//! *.lgp ─────┘                                         └──→ writer W-1 ┘
//!                    ^                                                     |
//!                    └──────────── read_position() on startup ────────────┘
//! ```
//!
//! # Key Design
//!
//! - **Checkpoint in the sink**: the resume position is whatever the sink has
//!   durably stored; sequence ids continue from it
//! - **Backpressure**: decode waits when C batches are queued
//! - **Fail-fast**: the first failed write stops every stage; nothing behind
//!   it is written
//! - **Batch-aligned shutdown**: cancellation drops the partial batch and
//!   lets queued batches finish
//!
//! # Example
//!
//! ```ignore
//! use evlog_pipeline::{Exporter, ExporterSettings};
//! use evlog_sinks::NullSink;
//!
//! let exporter = Exporter::new(ExporterSettings::default(), Arc::new(NullSink::new()));
//! let snapshot = exporter.run(cancel).await?;
//! ```

mod error;
mod exporter;
mod metrics;
mod reporter;
mod writer;

pub use error::{PipelineError, Result};
pub use exporter::{
    DEFAULT_PORTION_SIZE, DEFAULT_QUEUE_FACTOR, DEFAULT_WRITE_PARALLELISM, Exporter,
    ExporterSettings,
};
pub use metrics::{ExporterMetrics, MetricsSnapshot};
pub use reporter::MetricsReporter;
