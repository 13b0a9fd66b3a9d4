//! Exporter - decode stage and pipeline lifecycle
//!
//! Pulls records from the tailer one at a time, numbers them, groups them
//! into portions and hands full portions to the write stage.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use evlog_protocol::EventRecord;
use evlog_sinks::EventSink;
use evlog_sources::{TailEvent, Tailer, TailerSettings};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::metrics::{ExporterMetrics, MetricsSnapshot};
use crate::reporter::MetricsReporter;
use crate::writer::WriterPool;

/// Default records per batch
pub const DEFAULT_PORTION_SIZE: usize = 10_000;

/// Default write queue depth, in batches
pub const DEFAULT_QUEUE_FACTOR: usize = 2;

/// Default number of concurrent sink writes
pub const DEFAULT_WRITE_PARALLELISM: usize = 1;

/// Settings for one export run
#[derive(Debug, Clone)]
pub struct ExporterSettings {
    /// Source directory, live/archive mode, timeout, time zone, presentation
    pub tailer: TailerSettings,

    /// Records per batch (P)
    pub portion_size: usize,

    /// Write queue depth in batches (C)
    pub queue_factor: usize,

    /// Concurrent sink writes (W)
    pub write_parallelism: usize,

    /// Records dated before this day (in the source time zone) are skipped
    pub skip_events_before: Option<NaiveDate>,

    /// Log metrics at this interval while running
    pub metrics_interval: Option<Duration>,
}

impl Default for ExporterSettings {
    fn default() -> Self {
        Self {
            tailer: TailerSettings::default(),
            portion_size: DEFAULT_PORTION_SIZE,
            queue_factor: DEFAULT_QUEUE_FACTOR,
            write_parallelism: DEFAULT_WRITE_PARALLELISM,
            skip_events_before: None,
            metrics_interval: None,
        }
    }
}

impl ExporterSettings {
    /// Check sizes are usable
    pub fn validate(&self) -> Result<()> {
        if self.portion_size == 0 {
            return Err(PipelineError::config("portion_size must be at least 1"));
        }
        if self.queue_factor == 0 {
            return Err(PipelineError::config("queue_factor must be at least 1"));
        }
        if self.write_parallelism == 0 {
            return Err(PipelineError::config("write_parallelism must be at least 1"));
        }
        if self.tailer.reading_timeout.is_zero() {
            return Err(PipelineError::config("reading_timeout must be positive"));
        }
        Ok(())
    }

    /// First instant that is not skipped
    fn skip_bound(&self) -> Option<DateTime<Utc>> {
        self.skip_events_before.map(|day| {
            let midnight = day.and_time(NaiveTime::MIN);
            self.tailer
                .time_zone
                .to_utc(midnight)
                .unwrap_or_else(|| midnight.and_utc())
        })
    }
}

/// Export pipeline from a log directory into one sink
pub struct Exporter {
    settings: ExporterSettings,
    sink: Arc<dyn EventSink>,
    metrics: Arc<ExporterMetrics>,
}

impl Exporter {
    /// Create an exporter writing into `sink`
    pub fn new(settings: ExporterSettings, sink: Arc<dyn EventSink>) -> Self {
        Self {
            settings,
            sink,
            metrics: Arc::new(ExporterMetrics::new()),
        }
    }

    /// Shared metrics, valid after `run()` consumes the exporter
    pub fn metrics(&self) -> Arc<ExporterMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run until cancelled, drained (archive mode) or failed
    ///
    /// A sink failure stops the pipeline and is returned even if decoding
    /// also failed afterwards. On cancellation the partial batch is dropped
    /// and batches already queued are still written.
    pub async fn run(self, cancel: CancellationToken) -> Result<MetricsSnapshot> {
        self.settings.validate()?;

        let checkpoint = self
            .sink
            .read_position()
            .await
            .map_err(|source| PipelineError::SinkPosition {
                sink: self.sink.name().to_string(),
                source,
            })?;
        let next_id = match &checkpoint {
            Some(checkpoint) => {
                info!(sink = self.sink.name(), checkpoint = %checkpoint, "resuming from checkpoint");
                checkpoint.id + 1
            }
            None => {
                info!(sink = self.sink.name(), "no checkpoint, starting from the earliest file");
                1
            }
        };

        let mut tailer = Tailer::open(self.settings.tailer.clone(), checkpoint.as_ref()).await?;
        info!(
            dir = %tailer.dir().display(),
            live = self.settings.tailer.live_mode,
            portion_size = self.settings.portion_size,
            queue_factor = self.settings.queue_factor,
            write_parallelism = self.settings.write_parallelism,
            "exporter started"
        );

        // Cancelled by the caller or by the first failed write
        let stop = cancel.child_token();
        let pool = WriterPool::spawn(
            Arc::clone(&self.sink),
            self.settings.write_parallelism,
            self.settings.queue_factor,
            stop.clone(),
            Arc::clone(&self.metrics),
        );

        let reporter_stop = CancellationToken::new();
        let reporter = self.settings.metrics_interval.map(|every| {
            let reporter = MetricsReporter::new(Arc::clone(&self.metrics), Arc::clone(&self.sink), every);
            tokio::spawn(reporter.run(reporter_stop.clone()))
        });

        let decoded = self.decode(&mut tailer, &pool, &stop, next_id).await;
        let written = pool.finish().await;

        reporter_stop.cancel();
        if let Some(reporter) = reporter {
            let _ = reporter.await;
        }

        let snapshot = self.metrics.snapshot();
        info!(
            records_read = snapshot.records_read,
            records_written = snapshot.records_written,
            records_skipped = snapshot.records_skipped,
            batches_written = snapshot.batches_written,
            last_id = snapshot.last_id,
            "exporter stopped"
        );

        written?;
        decoded?;
        Ok(snapshot)
    }

    async fn decode(
        &self,
        tailer: &mut Tailer,
        pool: &WriterPool,
        stop: &CancellationToken,
        mut next_id: u64,
    ) -> Result<()> {
        let portion_size = self.settings.portion_size;
        let skip_before = self.settings.skip_bound();
        let mut batch: Vec<EventRecord> = Vec::with_capacity(portion_size);

        loop {
            match tailer.next(stop).await? {
                TailEvent::Record(mut record) => {
                    self.metrics.record_read();
                    if skip_before.is_some_and(|bound| record.date_time < bound) {
                        self.metrics.record_skipped();
                        continue;
                    }

                    record.id = next_id;
                    next_id += 1;
                    batch.push(record);

                    if batch.len() >= portion_size {
                        let full = std::mem::replace(&mut batch, Vec::with_capacity(portion_size));
                        if !pool.send(full, stop).await {
                            return Ok(());
                        }
                    }
                }
                TailEvent::TimedOut => {
                    self.metrics.record_timeout();
                    if !batch.is_empty() {
                        let partial = std::mem::replace(&mut batch, Vec::with_capacity(portion_size));
                        if !pool.send(partial, stop).await {
                            return Ok(());
                        }
                    }
                }
                TailEvent::Drained => {
                    let pending = batch.len();
                    if pending > 0 && !pool.send(batch, stop).await {
                        warn!(pending, "final partial batch not queued, pipeline stopping");
                        return Ok(());
                    }
                    info!("all files read");
                    return Ok(());
                }
                TailEvent::Cancelled => {
                    if !batch.is_empty() {
                        warn!(pending = batch.len(), "dropping partial batch on shutdown");
                    }
                    return Ok(());
                }
            }
        }
    }
}
