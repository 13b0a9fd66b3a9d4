//! Metrics reporting configuration
//!
//! Controls periodic logging of exporter and sink counters. A final
//! snapshot is always logged on shutdown regardless of these settings.

use serde::Deserialize;
use std::time::Duration;

/// Metrics configuration
///
/// # Example
///
/// ```toml
/// [metrics]
/// enabled = true
/// interval = "60s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable periodic metrics reporting
    /// Default: true
    pub enabled: bool,

    /// Reporting interval
    /// Default: 60s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
        }
    }
}

impl MetricsConfig {
    /// Reporting interval if reporting is enabled
    pub fn effective_interval(&self) -> Option<Duration> {
        self.enabled.then_some(self.interval)
    }
}
