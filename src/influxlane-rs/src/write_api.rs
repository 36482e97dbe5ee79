use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use influxlane_core::line_protocol::join_lines;
use influxlane_core::{ClientConfig, DestinationKey, WriteData, WriteMode, WriteOptions, WritePrecision};

use crate::service::WriteService;
use crate::worker::{BatchWorker, Command, ErrorCallback};
use crate::{Result, WriteError};

/// Per-call overrides of the client's default org, bucket and precision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteParameters {
    pub precision: Option<WritePrecision>,
    pub bucket: Option<String>,
    pub org: Option<String>,
}

impl WriteParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn precision(mut self, precision: WritePrecision) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn org(mut self, org: impl Into<String>) -> Self {
        self.org = Some(org.into());
        self
    }

    /// Merge with client defaults
    pub fn destination(&self, defaults: &ClientConfig) -> DestinationKey {
        DestinationKey {
            org: self.org.clone().unwrap_or_else(|| defaults.org.clone()),
            bucket: self.bucket.clone().unwrap_or_else(|| defaults.bucket.clone()),
            precision: self.precision.unwrap_or(defaults.precision),
        }
    }
}

struct WorkerHandle {
    commands: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

/// Write API bound to one [`WriteOptions`] for its whole life.
///
/// In synchronous mode every `write` sends one request and returns the
/// outcome. In batching mode `write` only validates and enqueues; failures of
/// background flushes go to the error callback and the log.
pub struct WriteApi {
    defaults: Arc<ClientConfig>,
    options: WriteOptions,
    service: Arc<WriteService>,
    worker: Option<WorkerHandle>,
    closed: AtomicBool,
}

impl WriteApi {
    pub(crate) fn new(
        defaults: Arc<ClientConfig>,
        options: WriteOptions,
        service: Arc<WriteService>,
        on_error: Option<ErrorCallback>,
    ) -> Self {
        let worker = match options.write_mode {
            WriteMode::Synchronous => None,
            WriteMode::Batching => {
                let (tx, rx) = mpsc::unbounded_channel();
                let task = BatchWorker::new(service.clone(), &options, on_error).start(rx);
                Some(WorkerHandle {
                    commands: Mutex::new(Some(tx)),
                    task: tokio::sync::Mutex::new(Some(task)),
                })
            }
        };

        Self {
            defaults,
            options,
            service,
            worker,
            closed: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Write to the client's default org, bucket and precision
    pub async fn write(&self, data: impl Into<WriteData>) -> Result<()> {
        self.write_with(data, WriteParameters::default()).await
    }

    /// Write with per-call overrides.
    ///
    /// Invalid points fail here, before any request is made. A write that
    /// encodes to nothing (empty string, only `None` entries) is a no-op.
    pub async fn write_with(
        &self,
        data: impl Into<WriteData>,
        parameters: WriteParameters,
    ) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(WriteError::Closed);
        }

        let destination = parameters.destination(&self.defaults);
        let lines = data.into().to_lines(destination.precision)?;
        if lines.is_empty() {
            debug!(destination = %destination, "Nothing to write");
            return Ok(());
        }

        match &self.worker {
            None => self.service.write(&destination, join_lines(&lines)).await,
            Some(worker) => worker.send(Command::Write { destination, lines }),
        }
    }

    /// Write ready line protocol to the default destination
    pub async fn write_raw(&self, payload: &str) -> Result<()> {
        self.write(payload).await
    }

    /// Flush all queued lines now and wait for the requests to finish.
    /// No-op in synchronous mode.
    pub async fn flush(&self) -> Result<()> {
        let Some(worker) = &self.worker else {
            return Ok(());
        };

        let (ack, done) = oneshot::channel();
        worker.send(Command::Flush(ack))?;
        done.await.map_err(|_| WriteError::Closed)
    }

    /// Stop the flush timer, flush everything still queued and wait for the
    /// background worker to exit. Calling it again does nothing.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        if let Some(worker) = &self.worker {
            // Dropping the last sender ends the worker loop after a final drain
            worker.commands.lock().unwrap_or_else(|e| e.into_inner()).take();

            if let Some(task) = worker.task.lock().await.take() {
                if let Err(e) = task.await {
                    tracing::error!("Batch write worker terminated abnormally: {}", e);
                }
            }
        }

        info!("Write API closed");
        Ok(())
    }
}

impl WorkerHandle {
    fn send(&self, command: Command) -> Result<()> {
        let commands = self.commands.lock().unwrap_or_else(|e| e.into_inner());
        match commands.as_ref() {
            Some(tx) => tx.send(command).map_err(|_| WriteError::Closed),
            None => Err(WriteError::Closed),
        }
    }
}
