//! Periodic metrics reporter
//!
//! Logs exporter and sink counters at a fixed interval until cancelled.

use std::sync::Arc;
use std::time::Duration;

use evlog_sinks::EventSink;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::metrics::{ExporterMetrics, MetricsSnapshot};

/// Reports pipeline and sink metrics at a configured interval
pub struct MetricsReporter {
    metrics: Arc<ExporterMetrics>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
    previous: Option<MetricsSnapshot>,
}

impl MetricsReporter {
    /// Create a new reporter
    pub fn new(metrics: Arc<ExporterMetrics>, sink: Arc<dyn EventSink>, interval: Duration) -> Self {
        Self {
            metrics,
            sink,
            interval,
            previous: None,
        }
    }

    /// Run the reporter until cancellation
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => self.report(),
            }
        }
    }

    /// Log current metrics once
    fn report(&mut self) {
        let snapshot = self.metrics.snapshot();
        let sink = self.sink.metrics().snapshot();
        let secs = self.interval.as_secs_f64().max(f64::EPSILON);
        let rate = self
            .previous
            .map_or(0.0, |prev| {
                snapshot.records_written.saturating_sub(prev.records_written) as f64 / secs
            });

        info!(
            records_read = snapshot.records_read,
            records_written = snapshot.records_written,
            records_skipped = snapshot.records_skipped,
            in_flight = snapshot.batches_in_flight(),
            last_id = snapshot.last_id,
            backpressure = snapshot.backpressure_events,
            timeouts = snapshot.timeouts,
            sink = self.sink.name(),
            sink_bytes = sink.bytes_written,
            records_per_sec = %format!("{rate:.1}"),
            "exporter metrics"
        );

        self.previous = Some(snapshot);
    }
}
