//! Configuration validation
//!
//! Validates config consistency:
//! - The source directory is set
//! - Batch sizes, queue depth and parallelism are positive
//! - Required fields are present for the chosen sink

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::sink::SinkConfig;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_exporter(config)?;
    validate_sink(config)?;
    validate_metrics(config)?;
    Ok(())
}

fn validate_exporter(config: &Config) -> Result<()> {
    let exporter = &config.exporter;

    match &exporter.log_folder {
        None => return Err(ConfigError::missing_field("exporter", "log_folder")),
        Some(path) if path.as_os_str().is_empty() => {
            return Err(ConfigError::invalid_value("exporter", "log_folder", "must not be empty"));
        }
        Some(_) => {}
    }

    for (field, value) in [
        ("portion_size", exporter.portion_size),
        ("queue_factor", exporter.queue_factor),
        ("write_parallelism", exporter.write_parallelism),
    ] {
        if value == 0 {
            return Err(ConfigError::invalid_value("exporter", field, "must be at least 1"));
        }
    }

    if exporter.reading_timeout.is_zero() {
        return Err(ConfigError::invalid_value(
            "exporter",
            "reading_timeout",
            "must be positive",
        ));
    }

    Ok(())
}

fn validate_sink(config: &Config) -> Result<()> {
    match &config.sink {
        SinkConfig::Null(_) | SinkConfig::Stdout(_) => Ok(()),
        SinkConfig::DiskPlaintext(disk) => {
            if disk.path.as_os_str().is_empty() {
                return Err(ConfigError::missing_field("sink", "path"));
            }
            if disk.file_name.is_empty() {
                return Err(ConfigError::invalid_value("sink", "file_name", "must not be empty"));
            }
            Ok(())
        }
        SinkConfig::Clickhouse(ch) => {
            if ch.url.is_empty() {
                return Err(ConfigError::missing_field("sink", "url"));
            }
            if ch.database.is_empty() {
                return Err(ConfigError::missing_field("sink", "database"));
            }
            if ch.table.is_empty() {
                return Err(ConfigError::missing_field("sink", "table"));
            }
            Ok(())
        }
    }
}

fn validate_metrics(config: &Config) -> Result<()> {
    if config.metrics.enabled && config.metrics.interval.is_zero() {
        return Err(ConfigError::invalid_value("metrics", "interval", "must be positive"));
    }
    Ok(())
}
