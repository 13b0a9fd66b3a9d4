//! Pipeline error types
//!
//! Error types for the export pipeline. Every variant is fatal: the
//! pipeline stops and the caller decides whether to restart.

use evlog_sinks::SinkError;
use evlog_sources::SourceError;
use thiserror::Error;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading or decoding the log directory failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The sink could not report its position
    #[error("sink {sink} failed to read position: {source}")]
    SinkPosition {
        sink: String,
        #[source]
        source: SinkError,
    },

    /// The sink rejected a batch
    #[error("sink {sink} failed to write batch ending at id {last_id}: {source}")]
    SinkWrite {
        sink: String,
        last_id: u64,
        #[source]
        source: SinkError,
    },

    /// Invalid pipeline settings
    #[error("invalid pipeline settings: {0}")]
    Config(String),

    /// A writer task ended abnormally
    #[error("writer task failed: {0}")]
    Writer(String),
}

impl PipelineError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
