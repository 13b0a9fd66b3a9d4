//! `[log]` section
//!
//! Diagnostics of the exporter itself. Exported records never go through
//! `tracing`, so the stdout sink and the `read` command keep stdout clean
//! as long as `output` stays on stderr.

use serde::Deserialize;

/// Crates whose events follow `level`; everything else is capped at warn
const OWN_TARGETS: [&str; 6] = [
    "evlog",
    "evlog_protocol",
    "evlog_sources",
    "evlog_sinks",
    "evlog_pipeline",
    "evlog_config",
];

/// Verbosity of the exporter's own events
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Every node and reference lookup
    Trace,
    /// File switches, batch hand-offs
    Debug,
    /// Startup, checkpoints, periodic metrics
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Name accepted by `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// `EnvFilter` directive applying this level to evlog crates only
    ///
    /// Dependencies (HTTP client, file watcher) stay at `warn` unless the
    /// level is `trace`.
    pub fn directive(&self) -> String {
        if *self == Self::Trace || *self >= Self::Warn {
            return self.as_str().to_string();
        }
        let own: Vec<String> = OWN_TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.as_str()))
            .collect();
        format!("warn,{}", own.join(","))
    }
}

/// Event rendering
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `tracing_subscriber` default text lines
    #[default]
    Console,
    /// One JSON object per event, for log shippers
    Json,
}

/// Stream diagnostics are written to
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
}

/// Logging configuration
///
/// ```toml
/// [log]
/// level = "debug"
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default: info
    pub level: LogLevel,

    /// Default: console
    pub format: LogFormat,

    /// Default: stderr
    pub output: LogOutput,
}
