//! Evlog Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Only the source directory is required; everything else has a default.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use evlog_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[exporter]\nlog_folder = \"/srv/1Cv8Log\"").unwrap();
//! assert_eq!(config.sink.type_name(), "stdout");
//! ```
//!
//! # Example Minimal Config
//!
//! ```toml
//! [exporter]
//! log_folder = "/var/1C/srvinfo/reg_1541/ab12/1Cv8Log"
//!
//! [sink]
//! type = "disk_plaintext"
//! path = "export/"
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! interval = "30s"
//!
//! [exporter]
//! log_folder = "/var/1C/srvinfo/reg_1541/ab12/1Cv8Log"
//! live_mode = true
//! portion_size = 10000
//! write_parallelism = 2
//! time_zone = "+03:00"
//! skip_events_before = "2024-01-01"
//!
//! [sink]
//! type = "clickhouse"
//! url = "http://localhost:8123"
//! database = "audit"
//! ```

mod error;
mod exporter;
mod logging;
mod metrics;
mod sink;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use exporter::ExporterConfig;
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use metrics::MetricsConfig;
pub use sink::{
    ClickHouseSinkConfig, DiskPlaintextSinkConfig, NullSinkConfig, SinkConfig, StdoutFormat,
    StdoutSinkConfig,
};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Metrics reporting configuration
    pub metrics: MetricsConfig,

    /// Source directory and batching
    pub exporter: ExporterConfig,

    /// Export destination
    pub sink: SinkConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Checks for:
    /// - The source directory is set
    /// - Sizes and timeouts are positive
    /// - Required sink fields are present
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
