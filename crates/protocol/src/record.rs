//! Event record and checkpoint types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fully decoded and resolved audit log entry
///
/// The provenance fields (`file_name`, `end_position`, `lgf_end_position`)
/// locate the byte right after this entry in its data file and the reference
/// file cursor at the time it was decoded. `id` is assigned by the exporter
/// and is 0 until then.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Data file name without extension
    pub file_name: String,
    /// Byte offset just past this entry in the data file
    pub end_position: u64,
    /// Reference file cursor when this entry was decoded
    pub lgf_end_position: u64,
    /// Sequence id, gapless and increasing in read order
    pub id: u64,

    pub date_time: DateTime<Utc>,
    pub transaction_status: String,
    pub transaction_date: Option<DateTime<Utc>>,
    pub transaction_number: i64,
    pub user_uuid: String,
    pub user: String,
    pub computer: String,
    pub application: String,
    pub connection: i64,
    pub event: String,
    pub severity: String,
    pub comment: String,
    pub metadata_uuid: String,
    pub metadata: String,
    /// Flattened payload, one `Item N: value` line per composite field
    pub data: String,
    pub data_presentation: String,
    pub server: String,
    pub main_port: i32,
    pub add_port: i32,
    pub session: i64,
}

impl EventRecord {
    /// Resume position right after this record
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            file_name: self.file_name.clone(),
            end_position: self.end_position,
            lgf_end_position: self.lgf_end_position,
            id: self.id,
        }
    }
}

/// Durable resume position, always taken from a sink-acknowledged record
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Data file name without extension
    pub file_name: String,
    /// Byte offset in the data file to continue from
    pub end_position: u64,
    /// Reference file offset already consumed
    pub lgf_end_position: u64,
    /// Sequence id of the last committed record
    pub id: u64,
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{} (lgf {}, id {})",
            self.file_name, self.end_position, self.lgf_end_position, self.id
        )
    }
}
