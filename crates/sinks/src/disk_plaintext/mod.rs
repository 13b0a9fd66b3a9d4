//! Disk Plaintext Sink - Human-readable record storage
//!
//! Appends one text line per record to a log file and keeps the resume
//! position in a JSON sidecar next to it.
//!
//! # Output Format
//!
//! ```text
//! [2024-03-15T10:30:00Z] [INFORMATION] id=1 file=20240315000000 event=_$Session$_.Start user=Alice computer=WS-042 application=1CV8C session=7 comment="" data=""
//! ```
//!
//! # Atomicity
//!
//! A batch is appended and synced, then the sidecar is replaced atomically
//! (write to a temp file, rename). The sidecar records the data file length
//! that belongs to the checkpoint; on open, anything past that length is an
//! unacknowledged partial batch and is truncated.
//!
//! # Directory Structure
//!
//! ```text
//! out/
//! ├── events.log       # record lines
//! └── position.json    # {"checkpoint": {...}, "data_len": 12345}
//! ```

use std::fmt::Write as _;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use evlog_protocol::{Checkpoint, EventRecord};
use serde::{Deserialize, Serialize};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{EventSink, SinkError, SinkMetrics};

/// Sidecar file name
const POSITION_FILE: &str = "position.json";

/// Configuration for disk plaintext sink
#[derive(Debug, Clone)]
pub struct DiskPlaintextConfig {
    /// Output directory path
    pub path: PathBuf,

    /// Name of the record file inside `path`
    pub file_name: String,
}

impl Default for DiskPlaintextConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("out"),
            file_name: "events.log".into(),
        }
    }
}

impl DiskPlaintextConfig {
    /// Create config with custom path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }
}

/// Sidecar content
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PositionFile {
    checkpoint: Checkpoint,
    data_len: u64,
}

struct State {
    file: File,
    /// Committed length of the record file
    len: u64,
    position: Option<Checkpoint>,
}

/// Sink writing text lines with a crash-safe checkpoint sidecar
pub struct DiskPlaintextSink {
    config: DiskPlaintextConfig,
    name: String,
    state: Mutex<State>,
    metrics: SinkMetrics,
}

impl DiskPlaintextSink {
    /// Open (or create) the output directory and recover the last position
    pub async fn open(config: DiskPlaintextConfig) -> Result<Self, SinkError> {
        fs::create_dir_all(&config.path).await?;

        let stored = read_position_file(&config.path.join(POSITION_FILE)).await?;
        let data_path = config.path.join(&config.file_name);
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&data_path)
            .await?;

        let committed = stored.as_ref().map_or(0, |p| p.data_len);
        let actual = file.metadata().await?.len();
        if actual < committed {
            return Err(SinkError::init(format!(
                "{} is shorter ({actual} bytes) than its checkpoint ({committed} bytes)",
                data_path.display()
            )));
        }
        if actual > committed {
            warn!(
                file = %data_path.display(),
                committed,
                actual,
                "truncating unacknowledged tail"
            );
            file.set_len(committed).await?;
        }
        file.seek(SeekFrom::Start(committed)).await?;

        let position = stored.map(|p| p.checkpoint);
        if let Some(checkpoint) = &position {
            info!(file = %data_path.display(), checkpoint = %checkpoint, "disk sink recovered position");
        }

        Ok(Self {
            config,
            name: "disk_plaintext".into(),
            state: Mutex::new(State {
                file,
                len: committed,
                position,
            }),
            metrics: SinkMetrics::new(),
        })
    }

    /// Set the sink name used in logs
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Path of the record file
    pub fn data_path(&self) -> PathBuf {
        self.config.path.join(&self.config.file_name)
    }

    async fn write_locked(&self, state: &mut State, batch: &[EventRecord]) -> Result<u64, SinkError> {
        let Some(last) = batch.last() else {
            return Ok(0);
        };

        let mut text = String::new();
        for record in batch {
            format_record(record, &mut text);
        }

        state.file.seek(SeekFrom::Start(state.len)).await?;
        state.file.write_all(text.as_bytes()).await?;
        state.file.sync_data().await?;

        let stored = PositionFile {
            checkpoint: last.checkpoint(),
            data_len: state.len + text.len() as u64,
        };
        write_position_file(&self.config.path, &stored).await?;

        state.len = stored.data_len;
        state.position = Some(stored.checkpoint);
        Ok(text.len() as u64)
    }
}

#[async_trait]
impl EventSink for DiskPlaintextSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_position(&self) -> Result<Option<Checkpoint>, SinkError> {
        Ok(self.state.lock().await.position.clone())
    }

    async fn write(&self, batch: &[EventRecord]) -> Result<(), SinkError> {
        self.metrics.batch_received();

        let mut state = self.state.lock().await;
        match self.write_locked(&mut state, batch).await {
            Ok(bytes) => {
                self.metrics.batch_written(batch.len() as u64, bytes);
                Ok(())
            }
            Err(e) => {
                self.metrics.write_error();
                // Drop whatever part of the batch reached the file
                let committed = state.len;
                if let Err(truncate) = state.file.set_len(committed).await {
                    warn!(error = %truncate, "failed to truncate partial batch");
                }
                Err(e)
            }
        }
    }

    fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }
}

async fn read_position_file(path: &Path) -> Result<Option<PositionFile>, SinkError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SinkError::position(format!("{}: {e}", path.display()))),
    }
}

async fn write_position_file(dir: &Path, stored: &PositionFile) -> Result<(), SinkError> {
    let tmp = dir.join(format!("{POSITION_FILE}.tmp"));
    let json = serde_json::to_vec_pretty(stored)?;

    let mut file = File::create(&tmp).await?;
    file.write_all(&json).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp, dir.join(POSITION_FILE)).await?;
    Ok(())
}

/// Format one record as a text line
pub fn format_record(record: &EventRecord, buf: &mut String) {
    let _ = writeln!(
        buf,
        "[{}] [{}] id={} file={} event={} user={} computer={} application={} session={} comment={:?} data={:?}",
        record.date_time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        record.severity.to_uppercase(),
        record.id,
        record.file_name,
        record.event,
        record.user,
        record.computer,
        record.application,
        record.session,
        record.comment,
        record.data,
    );
}
