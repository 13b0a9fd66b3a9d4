//! Tailing coordinator
//!
//! Sequences the rotated data files of a log directory and turns them into a
//! single ordered stream of records.
//!
//! # States
//!
//! ```text
//!                  newer file found
//!   NoReader ───────────────────────────→ ReaderOpen ──┐ record
//!      ↑                                    │    ↑      │
//!      │ file removed, nothing pending      │    └──────┘
//!      └────────────────────────────────────┤
//!                                           │ end of data, no newer file
//!                            live ┌─────────┴─────────┐ archive
//!                                 ↓                   ↓
//!                          WaitingForData          Drained
//!                      (event / timeout / cancel)
//! ```
//!
//! Files are ordered by `(modification time, name)`. A file is only replaced
//! once it returned end of data and a strictly newer file exists, so unread
//! bytes of an older file are always drained first.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use evlog_protocol::{Checkpoint, DATA_FILE_EXTENSION, EventRecord, Presentation, REFERENCE_FILE_NAME};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::reader::RecordReader;
use crate::resolver::ReferenceResolver;
use crate::timezone::SourceTimeZone;
use crate::watch::{DirWatch, WaitOutcome, wait_timeout};
use crate::{Result, SourceError};

/// Default time to wait for new data before reporting a timeout
pub const DEFAULT_READING_TIMEOUT: Duration = Duration::from_secs(1);

/// Tailer configuration
#[derive(Debug, Clone)]
pub struct TailerSettings {
    /// Directory holding the reference file and data files
    pub log_folder: PathBuf,
    /// Keep waiting for new data at the end of the newest file
    pub live_mode: bool,
    /// How long to wait for new data before reporting `TimedOut`
    pub reading_timeout: Duration,
    /// Time zone log timestamps are written in
    pub time_zone: SourceTimeZone,
    /// Table revision for short codes
    pub presentation: Presentation,
}

impl Default for TailerSettings {
    fn default() -> Self {
        Self {
            log_folder: PathBuf::new(),
            live_mode: true,
            reading_timeout: DEFAULT_READING_TIMEOUT,
            time_zone: SourceTimeZone::default(),
            presentation: Presentation::default(),
        }
    }
}

/// Result of asking the tailer for the next record
#[derive(Debug)]
#[allow(clippy::large_enum_variant)]
pub enum TailEvent {
    /// Next record in source order
    Record(EventRecord),
    /// No new data arrived within the reading timeout (live mode)
    TimedOut,
    /// Every file has been read (archive mode)
    Drained,
    /// The cancellation token fired
    Cancelled,
}

/// Ordering key of data files
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct FileMark {
    modified: SystemTime,
    name: String,
}

struct OpenReader {
    reader: RecordReader,
    /// Mark observed when the file was opened
    mark: FileMark,
}

/// Live-tailing coordinator over a log directory
pub struct Tailer {
    settings: TailerSettings,
    dir: PathBuf,
    resolver: ReferenceResolver,
    current: Option<OpenReader>,
    /// Mark of the last exhausted file; candidates must be newer
    last: Option<FileMark>,
    watch: Option<DirWatch>,
    /// End of the current wait-for-data period
    deadline: Option<Instant>,
}

impl Tailer {
    /// Open a log directory, resuming after `checkpoint` if given
    ///
    /// If the checkpoint's file no longer exists, reading restarts from the
    /// earliest data file.
    pub async fn open(settings: TailerSettings, checkpoint: Option<&Checkpoint>) -> Result<Self> {
        let dir = tokio::fs::canonicalize(&settings.log_folder)
            .await
            .map_err(|e| SourceError::io(&settings.log_folder, e))?;

        let watch = if settings.live_mode {
            match DirWatch::new(&dir) {
                Ok(watch) => Some(watch),
                Err(e) => {
                    warn!(error = %e, "filesystem watch unavailable, polling on reading timeout");
                    None
                }
            }
        } else {
            None
        };

        let mut tailer = Self {
            resolver: ReferenceResolver::new(dir.join(REFERENCE_FILE_NAME)),
            dir,
            settings,
            current: None,
            last: None,
            watch,
            deadline: None,
        };

        if let Some(checkpoint) = checkpoint {
            tailer.seed(checkpoint).await?;
        }

        info!(
            dir = %tailer.dir.display(),
            live = tailer.settings.live_mode,
            "tailer opened"
        );
        Ok(tailer)
    }

    async fn seed(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        let path = self.data_path(&checkpoint.file_name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            warn!(
                checkpoint = %checkpoint,
                "checkpoint file no longer exists, restarting from the earliest data file"
            );
            return Ok(());
        }

        self.resolver.seek(checkpoint.lgf_end_position).await?;
        self.open_reader(path, checkpoint.end_position).await?;

        info!(checkpoint = %checkpoint, "resuming from checkpoint");
        Ok(())
    }

    /// Directory being read (canonicalized)
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Name of the open data file, if any
    pub fn current_file(&self) -> Option<&str> {
        self.current.as_ref().map(|open| open.reader.file_name())
    }

    /// Next record, or the reason there is none
    pub async fn next(&mut self, cancel: &CancellationToken) -> Result<TailEvent> {
        loop {
            if cancel.is_cancelled() {
                return Ok(TailEvent::Cancelled);
            }

            let Some(open) = self.current.as_mut() else {
                if let Some(path) = self.next_file().await? {
                    self.open_reader(path, 0).await?;
                    continue;
                }
                if !self.settings.live_mode {
                    return Ok(TailEvent::Drained);
                }
                match self.wait(cancel).await {
                    WaitOutcome::Signalled => continue,
                    WaitOutcome::TimedOut => return Ok(TailEvent::TimedOut),
                    WaitOutcome::Cancelled => return Ok(TailEvent::Cancelled),
                }
            };

            match open.reader.next(&mut self.resolver).await {
                Ok(Some(record)) => {
                    self.deadline = None;
                    return Ok(TailEvent::Record(record));
                }
                Ok(None) => {
                    if let Some(next) = self.next_file().await? {
                        if let Some(record) = self.rotate(next).await? {
                            self.deadline = None;
                            return Ok(TailEvent::Record(record));
                        }
                        continue;
                    }

                    if !self.settings.live_mode {
                        if self.current.as_ref().is_some_and(|open| open.reader.has_partial()) {
                            warn!(
                                file = self.current_file().unwrap_or_default(),
                                "incomplete trailing record left unread"
                            );
                        }
                        return Ok(TailEvent::Drained);
                    }

                    match self.wait(cancel).await {
                        WaitOutcome::Signalled => continue,
                        WaitOutcome::TimedOut => return Ok(TailEvent::TimedOut),
                        WaitOutcome::Cancelled => return Ok(TailEvent::Cancelled),
                    }
                }
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "data file removed, moving on");
                    self.retire_reader().await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Replace the open file with `next`, which is newer
    ///
    /// Writes can land in the open file after its end-of-data read and
    /// before `next` shows up, so it is read once more first. A record
    /// found there is returned and the file stays open; the switch happens
    /// on the first call that reads nothing.
    pub(crate) async fn rotate(&mut self, next: PathBuf) -> Result<Option<EventRecord>> {
        if let Some(open) = self.current.as_mut() {
            match open.reader.next(&mut self.resolver).await {
                Ok(Some(record)) => return Ok(Some(record)),
                Ok(None) => {
                    if open.reader.has_partial() {
                        warn!(
                            file = open.reader.file_name(),
                            "discarding incomplete trailing record of rotated file"
                        );
                    }
                }
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "data file removed, moving on");
                }
                Err(e) => return Err(e),
            }
        }

        self.retire_reader().await;
        self.open_reader(next, 0).await?;
        Ok(None)
    }

    /// Wait for directory activity within the current wait period
    ///
    /// The period starts at the first wait after a record and spans any
    /// number of wakeups that yield no record, so a busy directory cannot
    /// postpone the timeout forever.
    async fn wait(&mut self, cancel: &CancellationToken) -> WaitOutcome {
        let now = Instant::now();
        let deadline = *self
            .deadline
            .get_or_insert(now + self.settings.reading_timeout);
        let remaining = deadline.saturating_duration_since(now);

        let outcome = if remaining.is_zero() {
            WaitOutcome::TimedOut
        } else {
            match &self.watch {
                Some(watch) => watch.wait(remaining, cancel).await,
                None => wait_timeout(remaining, cancel).await,
            }
        };

        if outcome == WaitOutcome::TimedOut {
            self.deadline = None;
        }
        outcome
    }

    async fn open_reader(&mut self, path: PathBuf, offset: u64) -> Result<()> {
        let modified = modified_time(&path).await?;
        let mut reader =
            RecordReader::open(&path, self.settings.time_zone, self.settings.presentation).await?;
        if offset > 0 {
            reader.set_position(offset).await?;
        }
        if let Some(watch) = &self.watch {
            reader = reader.with_gone_flag(watch.track(&path));
        }

        debug!(file = reader.file_name(), offset, "opened data file");
        self.current = Some(OpenReader {
            mark: FileMark {
                modified,
                name: reader.file_name().to_string(),
            },
            reader,
        });
        Ok(())
    }

    async fn retire_reader(&mut self) {
        let Some(open) = self.current.take() else {
            return;
        };
        if let Some(watch) = &self.watch {
            watch.untrack(open.reader.path());
        }

        let mark = match modified_time(open.reader.path()).await {
            Ok(modified) => FileMark {
                modified: modified.max(open.mark.modified),
                name: open.mark.name,
            },
            Err(_) => open.mark,
        };
        debug!(file = %mark.name, "retired data file");
        self.last = Some(mark);
    }

    /// Oldest data file strictly newer than the open or last exhausted one
    async fn next_file(&self) -> Result<Option<PathBuf>> {
        let reference = match &self.current {
            Some(open) => Some(match modified_time(open.reader.path()).await {
                Ok(modified) => FileMark {
                    modified: modified.max(open.mark.modified),
                    name: open.mark.name.clone(),
                },
                Err(_) => open.mark.clone(),
            }),
            None => self.last.clone(),
        };
        let current_path = self.current.as_ref().map(|open| open.reader.path());

        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| SourceError::io(&self.dir, e))?;

        let mut best: Option<(FileMark, PathBuf)> = None;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SourceError::io(&self.dir, e))?
        {
            let path = entry.path();
            if !is_data_file(&path) || Some(path.as_path()) == current_path {
                continue;
            }
            // Files can disappear between listing and stat
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let Ok(modified) = metadata.modified() else {
                continue;
            };

            let mark = FileMark {
                modified,
                name: file_stem(&path),
            };
            let newer = reference.as_ref().is_none_or(|r| mark > *r);
            let earliest = best.as_ref().is_none_or(|(b, _)| mark < *b);
            if newer && earliest {
                best = Some((mark, path));
            }
        }

        Ok(best.map(|(_, path)| path))
    }

    fn data_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(format!("{file_name}.{DATA_FILE_EXTENSION}"))
    }
}

fn is_data_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(DATA_FILE_EXTENSION))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn modified_time(path: &Path) -> Result<SystemTime> {
    tokio::fs::metadata(path)
        .await
        .and_then(|metadata| metadata.modified())
        .map_err(|e| SourceError::io(path, e))
}
