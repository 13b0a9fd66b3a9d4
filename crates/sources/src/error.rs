//! Source error types

use std::path::{Path, PathBuf};

use evlog_protocol::FormatError;
use thiserror::Error;

use crate::resolver::Category;

/// Errors raised while reading a log directory
#[derive(Debug, Error)]
pub enum SourceError {
    /// Malformed node in a reference or data file
    #[error("format error in {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// Referenced entry absent by the end of the reference file
    #[error("reference {category}:{index} not found in reference file")]
    ResolverLookup { category: Category, index: u32 },

    /// Open data file was removed externally
    #[error("data file {} was removed (partial record pending: {pending})", .path.display())]
    SourceGone { path: PathBuf, pending: bool },

    /// Reference file does not exist
    #[error("reference file not found: {}", .0.display())]
    ReferenceMissing(PathBuf),

    /// I/O failure on a specific path
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem watch could not be set up
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl SourceError {
    /// Create a format error for a file
    pub fn format(path: &Path, source: FormatError) -> Self {
        Self::Format {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create an I/O error for a file
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True if the pipeline can move past this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SourceGone { pending: false, .. })
    }
}

/// Result type for source operations
pub type Result<T> = std::result::Result<T, SourceError>;
