//! ClickHouse Sink - Analytics database
//!
//! Inserts event log records into a single MergeTree table.
//!
//! # Features
//!
//! - **Schema bootstrap**: Database and table created on first use
//! - **One INSERT per batch**: A batch lands completely or not at all
//! - **Position from data**: The row with the highest `Id` is the checkpoint
//!
//! # Table
//!
//! | Table | Purpose |
//! |-------|---------|
//! | EventLogItems | Decoded records, partitioned by month |

mod config;
mod error;
mod row;
mod sink;

// Re-export public API
pub use config::{ClickHouseConfig, DEFAULT_TABLE, DEFAULT_URL};
pub use error::ClickHouseSinkError;
pub use row::{EventLogRow, PositionRow};
pub use sink::ClickHouseSink;
