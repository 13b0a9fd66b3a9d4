//! Exporter configuration
//!
//! Where to read the audit log from and how records are batched on their
//! way to the sink.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use evlog_protocol::Presentation;
use evlog_sources::SourceTimeZone;
use serde::Deserialize;

/// Exporter configuration
///
/// # Example
///
/// ```toml
/// [exporter]
/// log_folder = "/var/1C/srvinfo/reg_1541/ab12/1Cv8Log"
/// live_mode = true
/// portion_size = 10000
/// queue_factor = 2
/// write_parallelism = 1
/// reading_timeout = "1s"
/// time_zone = "+03:00"
/// presentation = "short"
/// skip_events_before = "2024-01-01"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Directory with `1Cv8.lgf` and the `*.lgp` data files
    /// Required
    pub log_folder: Option<PathBuf>,

    /// Keep waiting for new data at the end of the newest file
    /// Default: true
    pub live_mode: bool,

    /// Records per batch
    /// Default: 10000
    pub portion_size: usize,

    /// Write queue depth, in batches
    /// Default: 2
    pub queue_factor: usize,

    /// Concurrent sink writes
    /// Default: 1
    pub write_parallelism: usize,

    /// How long to wait for new data before flushing a partial batch
    /// Default: 1s
    #[serde(with = "humantime_serde")]
    pub reading_timeout: Duration,

    /// Time zone the log timestamps were written in (local, utc, +HH:MM)
    /// Default: local
    pub time_zone: SourceTimeZone,

    /// Code table revision (short, long)
    /// Default: short
    pub presentation: Presentation,

    /// Skip records dated before this day
    /// Default: none
    pub skip_events_before: Option<NaiveDate>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            log_folder: None,
            live_mode: true,
            portion_size: 10_000,
            queue_factor: 2,
            write_parallelism: 1,
            reading_timeout: Duration::from_secs(1),
            time_zone: SourceTimeZone::default(),
            presentation: Presentation::default(),
            skip_events_before: None,
        }
    }
}
