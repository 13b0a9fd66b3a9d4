//! Write stage
//!
//! A bounded queue of batches drained by a fixed number of writer tasks.
//! The first sink failure is kept, stops the remaining writers before they
//! take another batch, and cancels the decode stage.

use std::sync::Arc;

use evlog_protocol::EventRecord;
use evlog_sinks::EventSink;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::{PipelineError, Result};
use crate::metrics::ExporterMetrics;

type Batch = Vec<EventRecord>;

/// Writer tasks sharing one bounded queue
pub(crate) struct WriterPool {
    sender: mpsc::Sender<Batch>,
    workers: Vec<JoinHandle<()>>,
    failure: Arc<Mutex<Option<PipelineError>>>,
    metrics: Arc<ExporterMetrics>,
}

struct Worker {
    id: usize,
    sink: Arc<dyn EventSink>,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Batch>>>,
    failure: Arc<Mutex<Option<PipelineError>>>,
    /// Cancelled on the first failed write
    failed: CancellationToken,
    /// Decode stage token, cancelled together with `failed`
    stop: CancellationToken,
    metrics: Arc<ExporterMetrics>,
}

impl WriterPool {
    /// Spawn `parallelism` writers over a queue holding `queue_depth` batches
    pub(crate) fn spawn(
        sink: Arc<dyn EventSink>,
        parallelism: usize,
        queue_depth: usize,
        stop: CancellationToken,
        metrics: Arc<ExporterMetrics>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_depth.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let failure = Arc::new(Mutex::new(None));
        let failed = CancellationToken::new();

        let workers = (0..parallelism.max(1))
            .map(|id| {
                let worker = Worker {
                    id,
                    sink: Arc::clone(&sink),
                    receiver: Arc::clone(&receiver),
                    failure: Arc::clone(&failure),
                    failed: failed.clone(),
                    stop: stop.clone(),
                    metrics: Arc::clone(&metrics),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        Self {
            sender,
            workers,
            failure,
            metrics,
        }
    }

    /// Enqueue a batch, waiting for room in the queue
    ///
    /// Returns `false` when the batch was not enqueued because `stop` fired
    /// or every writer has exited.
    pub(crate) async fn send(&self, batch: Batch, stop: &CancellationToken) -> bool {
        let last_id = batch.last().map_or(0, |r| r.id);
        let len = batch.len();

        let batch = match self.sender.try_send(batch) {
            Ok(()) => {
                self.enqueued(len, last_id);
                return true;
            }
            Err(TrySendError::Full(batch)) => {
                self.metrics.record_backpressure();
                debug!(last_id, "write queue full (backpressure)");
                batch
            }
            Err(TrySendError::Closed(_)) => return false,
        };

        tokio::select! {
            biased;
            _ = stop.cancelled() => false,
            sent = self.sender.send(batch) => {
                let sent = sent.is_ok();
                if sent {
                    self.enqueued(len, last_id);
                }
                sent
            }
        }
    }

    fn enqueued(&self, len: usize, last_id: u64) {
        self.metrics.record_enqueued(last_id);
        debug!(records = len, last_id, "batch enqueued");
    }

    /// Close the queue, wait for the writers and return the first failure
    pub(crate) async fn finish(self) -> Result<()> {
        drop(self.sender);

        let mut panicked = None;
        for worker in self.workers {
            if let Err(e) = worker.await {
                panicked.get_or_insert(PipelineError::Writer(e.to_string()));
            }
        }

        let failure = self.failure.lock().take();
        match failure.or(panicked) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Worker {
    async fn run(self) {
        loop {
            let batch = {
                let mut receiver = self.receiver.lock().await;
                tokio::select! {
                    biased;
                    _ = self.failed.cancelled() => None,
                    batch = receiver.recv() => batch,
                }
            };
            let Some(batch) = batch else {
                break;
            };

            let last_id = batch.last().map_or(0, |r| r.id);
            match self.sink.write(&batch).await {
                Ok(()) => {
                    self.metrics.record_written(batch.len() as u64);
                    debug!(worker = self.id, records = batch.len(), last_id, "batch written");
                }
                Err(source) => {
                    self.metrics.record_write_error();
                    error!(
                        worker = self.id,
                        sink = self.sink.name(),
                        last_id,
                        error = %source,
                        "batch write failed, stopping pipeline"
                    );
                    self.failure.lock().get_or_insert(PipelineError::SinkWrite {
                        sink: self.sink.name().to_string(),
                        last_id,
                        source,
                    });
                    self.failed.cancel();
                    self.stop.cancel();
                    break;
                }
            }
        }
    }
}
