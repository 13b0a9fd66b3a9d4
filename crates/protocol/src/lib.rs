//! evlog Protocol - Bracket notation and event record types
//!
//! This crate provides the foundational types shared by the reader, the
//! export pipeline and the sinks:
//! - `Node` - Decoded element of the bracket notation
//! - `parse_block` / `next_node` - Full-buffer and incremental decoding
//! - `EventRecord` - Fully resolved audit log entry
//! - `Checkpoint` - Durable resume position
//! - `Presentation` - Display tables for short codes
//!
//! # Design Principles
//!
//! - **Incremental**: `next_node` works on a buffer that a writer is still
//!   appending to and never consumes a partial node
//! - **Byte-exact**: consumed lengths are reported in bytes so callers can
//!   track file offsets for resumption
//! - **One record type**: sinks map `EventRecord` onto their own schema

mod decode;
mod error;
mod node;
mod presentation;
mod record;

pub use decode::{has_partial_node, next_node, parse_block};
pub use error::FormatError;
pub use node::Node;
pub use presentation::{Presentation, Severity, TransactionStatus};
pub use record::{Checkpoint, EventRecord};

/// Result type for decoding operations
pub type Result<T> = std::result::Result<T, FormatError>;

/// Reference file name inside a log directory
pub const REFERENCE_FILE_NAME: &str = "1Cv8.lgf";

/// Data file extension (without the dot)
pub const DATA_FILE_EXTENSION: &str = "lgp";

// Test modules - only compiled during testing
#[cfg(test)]
mod decode_test;
#[cfg(test)]
mod presentation_test;
