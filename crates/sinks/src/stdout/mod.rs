//! Stdout Sink - Human-readable debug output
//!
//! Prints records to stdout, either as aligned text lines or as JSON lines.
//! The position is kept in memory only, like the null sink.
//!
//! # Example Output
//!
//! ```text
//! 2024-03-15 10:30:00 #1     Information  _$Session$_.Start  Alice@WS-042 1CV8C
//! 2024-03-15 10:30:02 #2     Error        _$Data$_.Post      Bob@WS-007 1CV8C  posting failed
//! ```

use std::fmt::Write as _;
use std::io::Write as _;

use async_trait::async_trait;
use evlog_protocol::{Checkpoint, EventRecord, Presentation, Severity};
use owo_colors::{OwoColorize, Style};
use parking_lot::Mutex;
use serde::Deserialize;

use crate::{EventSink, SinkError, SinkMetrics};

/// Line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned, optionally colored text
    #[default]
    Text,
    /// One JSON object per record
    Json,
}

/// Configuration for stdout sink
#[derive(Debug, Clone)]
pub struct StdoutConfig {
    /// Enable colored output (text format only)
    pub color: bool,

    /// Line format
    pub format: OutputFormat,
}

impl Default for StdoutConfig {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Text,
        }
    }
}

impl StdoutConfig {
    /// Create config with colors disabled (for piped output)
    pub fn no_color() -> Self {
        Self {
            color: false,
            ..Self::default()
        }
    }

    /// Create config for JSON lines
    pub fn json() -> Self {
        Self {
            color: false,
            format: OutputFormat::Json,
        }
    }
}

// =============================================================================
// Color Styles
// =============================================================================

/// Color styles for terminal output
struct Styles {
    timestamp: Style,
    label: Style,
    data: Style,
}

impl Styles {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                timestamp: Style::new().dimmed(),
                label: Style::new().dimmed(),
                data: Style::new().dimmed(),
            }
        } else {
            Self {
                timestamp: Style::new(),
                label: Style::new(),
                data: Style::new(),
            }
        }
    }
}

/// Get style for a presented severity in either table revision
fn severity_style(severity: &str, enabled: bool) -> Style {
    if !enabled {
        return Style::new();
    }
    let is = |s: Severity| {
        [Presentation::Short, Presentation::Long]
            .into_iter()
            .any(|p| s.label(p) == severity)
    };
    if is(Severity::Error) {
        Style::new().red()
    } else if is(Severity::Warning) {
        Style::new().yellow()
    } else if is(Severity::Notification) {
        Style::new().dimmed()
    } else {
        Style::new()
    }
}

// =============================================================================
// StdoutSink Implementation
// =============================================================================

/// Stdout sink for debug output
pub struct StdoutSink {
    config: StdoutConfig,
    name: String,
    position: Mutex<Option<Checkpoint>>,
    metrics: SinkMetrics,
}

impl StdoutSink {
    /// Create a new stdout sink with default config
    pub fn new() -> Self {
        Self::with_config(StdoutConfig::default())
    }

    /// Create a new stdout sink with custom config
    pub fn with_config(config: StdoutConfig) -> Self {
        Self::with_name_and_config("stdout", config)
    }

    /// Create a new stdout sink with custom name and config
    pub fn with_name_and_config(name: impl Into<String>, config: StdoutConfig) -> Self {
        Self {
            config,
            name: name.into(),
            position: Mutex::new(None),
            metrics: SinkMetrics::new(),
        }
    }

    /// Render a batch the way it is printed
    pub fn render(&self, batch: &[EventRecord]) -> Result<String, SinkError> {
        let mut out = String::new();
        match self.config.format {
            OutputFormat::Text => {
                let styles = Styles::new(self.config.color);
                for record in batch {
                    format_text(record, &styles, self.config.color, &mut out);
                }
            }
            OutputFormat::Json => {
                for record in batch {
                    out.push_str(&serde_json::to_string(record)?);
                    out.push('\n');
                }
            }
        }
        Ok(out)
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for StdoutSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_position(&self) -> Result<Option<Checkpoint>, SinkError> {
        Ok(self.position.lock().clone())
    }

    async fn write(&self, batch: &[EventRecord]) -> Result<(), SinkError> {
        self.metrics.batch_received();

        let text = self.render(batch).inspect_err(|_| self.metrics.write_error())?;
        std::io::stdout()
            .lock()
            .write_all(text.as_bytes())
            .inspect_err(|_| self.metrics.write_error())?;

        if let Some(last) = batch.last() {
            *self.position.lock() = Some(last.checkpoint());
        }
        self.metrics
            .batch_written(batch.len() as u64, text.len() as u64);
        Ok(())
    }

    fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }
}

fn format_text(record: &EventRecord, styles: &Styles, color: bool, out: &mut String) {
    let ts = record.date_time.format("%Y-%m-%d %H:%M:%S").to_string();
    let id = format!("#{:<5}", record.id);
    let severity = format!("{:12}", record.severity);
    let who = if record.computer.is_empty() {
        record.user.clone()
    } else {
        format!("{}@{}", record.user, record.computer)
    };

    let _ = write!(
        out,
        "{} {} {} {} {} {}",
        ts.style(styles.timestamp),
        id.style(styles.label),
        severity.style(severity_style(&record.severity, color)),
        record.event,
        who,
        record.application.style(styles.label),
    );
    if !record.comment.is_empty() {
        let _ = write!(out, "  {}", record.comment);
    }
    if !record.data.is_empty() {
        let _ = write!(out, "  {}", record.data.replace('\n', "; ").style(styles.data));
    }
    out.push('\n');
}

#[cfg(test)]
#[path = "stdout_test.rs"]
mod stdout_test;
