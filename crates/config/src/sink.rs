//! Sink configuration types
//!
//! Exactly one sink receives the exported records. The sink type is chosen
//! with the `type` key of the `[sink]` section.

use serde::Deserialize;
use std::path::PathBuf;

/// Configuration for the export destination
///
/// # Example
///
/// ```toml
/// [sink]
/// type = "clickhouse"
/// url = "http://localhost:8123"
/// database = "audit"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Null sink - discards all data (for benchmarking)
    Null(NullSinkConfig),

    /// Stdout sink - one line per record
    Stdout(StdoutSinkConfig),

    /// Plaintext disk sink - append-only log file with a position sidecar
    DiskPlaintext(DiskPlaintextSinkConfig),

    /// ClickHouse sink - one row per record
    Clickhouse(ClickHouseSinkConfig),
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::Stdout(StdoutSinkConfig::default())
    }
}

impl SinkConfig {
    /// Get the sink type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null(_) => "null",
            Self::Stdout(_) => "stdout",
            Self::DiskPlaintext(_) => "disk_plaintext",
            Self::Clickhouse(_) => "clickhouse",
        }
    }
}

/// Null sink configuration - discards all data
///
/// # Example
///
/// ```toml
/// [sink]
/// type = "null"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NullSinkConfig {}

/// Record rendering for the stdout sink
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StdoutFormat {
    /// Human-readable line per record (default)
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Stdout sink configuration
///
/// # Example
///
/// ```toml
/// [sink]
/// type = "stdout"
/// format = "json"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StdoutSinkConfig {
    /// Colorize severity in text output
    /// Default: true
    pub color: bool,

    /// Output format (text, json)
    /// Default: text
    pub format: StdoutFormat,
}

impl Default for StdoutSinkConfig {
    fn default() -> Self {
        Self {
            color: true,
            format: StdoutFormat::Text,
        }
    }
}

/// Plaintext disk sink configuration
///
/// # Example
///
/// ```toml
/// [sink]
/// type = "disk_plaintext"
/// path = "export/"
/// file_name = "events.log"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiskPlaintextSinkConfig {
    /// Output directory
    /// Required
    pub path: PathBuf,

    /// Data file name inside `path`
    /// Default: events.log
    pub file_name: String,
}

impl Default for DiskPlaintextSinkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            file_name: "events.log".into(),
        }
    }
}

/// ClickHouse sink configuration
///
/// # Example
///
/// ```toml
/// [sink]
/// type = "clickhouse"
/// url = "http://clickhouse:8123"
/// database = "audit"
/// table = "EventLogItems"
/// username = "exporter"
/// password = "secret"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClickHouseSinkConfig {
    /// HTTP endpoint
    /// Default: http://localhost:8123
    pub url: String,

    /// Database name
    /// Default: default
    pub database: String,

    /// Table name
    /// Default: EventLogItems
    pub table: String,

    /// Username (optional)
    pub username: Option<String>,

    /// Password (optional)
    pub password: Option<String>,

    /// Create the database and table on first use
    /// Default: true
    pub create_schema: bool,
}

impl Default for ClickHouseSinkConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".into(),
            database: "default".into(),
            table: "EventLogItems".into(),
            username: None,
            password: None,
            create_schema: true,
        }
    }
}
