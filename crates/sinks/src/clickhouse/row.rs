//! Row types for the event log table

use chrono::{DateTime, Utc};
use clickhouse::Row;
use evlog_protocol::{Checkpoint, EventRecord};
use serde::{Deserialize, Serialize};

use super::error::ClickHouseSinkError;

/// One event log record (EventLogItems table)
///
/// Column names mirror the record fields in PascalCase; `DateTime` columns
/// are carried as Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Row, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventLogRow {
    pub file_name: String,
    pub end_position: u64,
    pub lgf_end_position: u64,
    pub id: u64,
    pub date_time: u32,
    pub transaction_status: String,
    /// 0 when the record has no transaction
    pub transaction_date: u32,
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
    pub data: String,
    pub data_presentation: String,
    pub server: String,
    pub main_port: i32,
    pub add_port: i32,
    pub session: i64,
}

impl EventLogRow {
    /// Map a decoded record to a row
    pub fn from_record(record: &EventRecord) -> Result<Self, ClickHouseSinkError> {
        let date_time = unix_seconds(record.id, record.date_time)?;
        let transaction_date = match record.transaction_date {
            Some(date) => unix_seconds(record.id, date)?,
            None => 0,
        };

        Ok(Self {
            file_name: record.file_name.clone(),
            end_position: record.end_position,
            lgf_end_position: record.lgf_end_position,
            id: record.id,
            date_time,
            transaction_status: record.transaction_status.clone(),
            transaction_date,
            transaction_number: record.transaction_number,
            user_uuid: record.user_uuid.clone(),
            user: record.user.clone(),
            computer: record.computer.clone(),
            application: record.application.clone(),
            connection: record.connection,
            event: record.event.clone(),
            severity: record.severity.clone(),
            comment: record.comment.clone(),
            metadata_uuid: record.metadata_uuid.clone(),
            metadata: record.metadata.clone(),
            data: record.data.clone(),
            data_presentation: record.data_presentation.clone(),
            server: record.server.clone(),
            main_port: record.main_port,
            add_port: record.add_port,
            session: record.session,
        })
    }
}

/// ClickHouse `DateTime` covers 1970-01-01 to 2106-02-07
fn unix_seconds(id: u64, at: DateTime<Utc>) -> Result<u32, ClickHouseSinkError> {
    u32::try_from(at.timestamp()).map_err(|_| ClickHouseSinkError::InvalidRow {
        id,
        message: format!("{at} is outside the DateTime range"),
    })
}

/// Position columns of the newest row
#[derive(Debug, Clone, PartialEq, Eq, Row, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PositionRow {
    pub file_name: String,
    pub end_position: u64,
    pub lgf_end_position: u64,
    pub id: u64,
}

impl From<PositionRow> for Checkpoint {
    fn from(row: PositionRow) -> Self {
        Self {
            file_name: row.file_name,
            end_position: row.end_position,
            lgf_end_position: row.lgf_end_position,
            id: row.id,
        }
    }
}
