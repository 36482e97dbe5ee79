use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, error, info};

use influxlane_core::{Batch, BatchBuffer, DestinationKey, WriteOptions};

use crate::service::WriteService;
use crate::WriteError;

/// Receives batching-mode failures, which happen after `write` has already returned.
pub type ErrorCallback = Arc<dyn Fn(&DestinationKey, &WriteError) + Send + Sync>;

pub(crate) enum Command {
    Write {
        destination: DestinationKey,
        lines: Vec<String>,
    },
    Flush(oneshot::Sender<()>),
}

/// Background task that owns the batch queues of one batching write API.
///
/// Writers talk to it only through the command channel, so size-triggered
/// and timer-triggered flushes run one after another on the same task.
pub(crate) struct BatchWorker {
    service: Arc<WriteService>,
    buffer: BatchBuffer,
    flush_interval: Duration,
    on_error: Option<ErrorCallback>,
}

impl BatchWorker {
    pub fn new(
        service: Arc<WriteService>,
        options: &WriteOptions,
        on_error: Option<ErrorCallback>,
    ) -> Self {
        Self {
            service,
            buffer: BatchBuffer::new(options.batch_size),
            flush_interval: options.flush_interval().max(Duration::from_millis(1)),
            on_error,
        }
    }

    /// Start the worker. It runs until every command sender is dropped,
    /// then flushes whatever is still queued and exits.
    pub fn start(self, commands: mpsc::UnboundedReceiver<Command>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(commands))
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        info!(
            flush_interval_ms = self.flush_interval.as_millis() as u64,
            "Batch write worker started"
        );

        let mut interval = time::interval_at(Instant::now() + self.flush_interval, self.flush_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Write { destination, lines }) => {
                        for line in lines {
                            if let Some(batch) = self.buffer.add(&destination, line) {
                                debug!(destination = %batch.destination, lines = batch.len(), "Batch full, flushing");
                                self.flush_batch(batch).await;
                            }
                        }
                    }
                    Some(Command::Flush(ack)) => {
                        self.flush_all().await;
                        let _ = ack.send(());
                    }
                    None => break,
                },
                _ = interval.tick() => {
                    self.flush_all().await;
                }
            }
        }

        self.flush_all().await;
        info!("Batch write worker stopped");
    }

    async fn flush_all(&mut self) {
        for batch in self.buffer.drain_all() {
            self.flush_batch(batch).await;
        }
    }

    async fn flush_batch(&self, batch: Batch) {
        if let Err(e) = self.service.write(&batch.destination, batch.body()).await {
            error!(
                destination = %batch.destination,
                lines = batch.len(),
                "Failed to write batch: {}",
                e
            );
            if let Some(on_error) = &self.on_error {
                on_error(&batch.destination, &e);
            }
        }
    }
}
