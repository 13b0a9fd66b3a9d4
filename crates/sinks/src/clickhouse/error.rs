//! ClickHouse sink errors

/// Errors from ClickHouse sink
#[derive(Debug, thiserror::Error)]
pub enum ClickHouseSinkError {
    /// ClickHouse client error
    #[error("clickhouse error: {0}")]
    ClickHouse(#[from] clickhouse::error::Error),

    /// Schema creation failed
    #[error("failed to create {object}: {source}")]
    Schema {
        object: String,
        #[source]
        source: clickhouse::error::Error,
    },

    /// Record cannot be represented as a row
    #[error("invalid row for record {id}: {message}")]
    InvalidRow { id: u64, message: String },
}
