//! evlog Sources - Reading audit log directories
//!
//! Turns a log directory (one growing reference file plus rotated data files)
//! into an ordered stream of resolved `EventRecord` values.
//!
//! # Architecture
//!
//! ```text
//!   1Cv8.lgf ──→ ReferenceResolver ──┐
//!                (forward-only cache) │ (category, index) lookups
//!                                     ↓
//!   *.lgp ───→ RecordReader ───→ Tailer ───→ TailEvent::{Record, TimedOut,
//!              (one per file)    (rotation,              Drained, Cancelled}
//!                                 DirWatch)
//! ```
//!
//! # Design Principles
//!
//! - **Forward-only**: the reference file is never re-read; entries are
//!   cached the first time the cursor passes them
//! - **Byte-exact offsets**: every record carries the offset right after it
//!   and the reference cursor, so a checkpoint resumes precisely
//! - **Partial-safe**: an entry the writer has not finished yet is left in
//!   the buffer and completed on a later read
//! - **Signals by value**: timeouts, end of data and cancellation are
//!   `TailEvent` variants, not errors
//!
//! # Example
//!
//! ```ignore
//! use evlog_sources::{Tailer, TailerSettings, TailEvent};
//! use tokio_util::sync::CancellationToken;
//!
//! let settings = TailerSettings {
//!     log_folder: "/var/log/app/1Cv8Log".into(),
//!     live_mode: false,
//!     ..Default::default()
//! };
//! let mut tailer = Tailer::open(settings, None).await?;
//! let cancel = CancellationToken::new();
//!
//! while let TailEvent::Record(record) = tailer.next(&cancel).await? {
//!     println!("{} {}", record.date_time, record.event);
//! }
//! ```

mod error;
mod reader;
mod resolver;
mod stream;
mod tailer;
mod timezone;
mod watch;

/// Fixture writers for log directories
pub mod test;

pub use error::{Result, SourceError};
pub use reader::RecordReader;
pub use resolver::{Category, ReferenceResolver};
pub use tailer::{DEFAULT_READING_TIMEOUT, TailEvent, Tailer, TailerSettings};
pub use timezone::SourceTimeZone;
pub use watch::{DirWatch, WaitOutcome};

#[cfg(test)]
mod resolver_test;
#[cfg(test)]
mod tailer_test;
