use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    JobId, QueueError, QueueResult,
    backend::{JobQueue, JobStore},
    handler::HandlerRegistry,
    observability::ObservabilityLayer,
    orchestrator::{Orchestrator, SubmitRequest},
    status::{JobStatusView, StatusReader},
    sweep::{StaleJobSweeper, SweepReport},
    worker::{Worker, WorkerOutcome},
};

/// Configuration for queue adapter
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// How often the scheduler triggers one worker invocation
    pub worker_interval: Duration,
    /// Execution ceiling of one worker invocation
    pub max_invocation_duration: Duration,
    /// A job processing for longer than this is considered abandoned
    pub stale_after: Duration,
    /// How often the scheduler runs the stale sweep
    pub sweep_interval: Duration,
    /// Per-subscriber event buffer
    pub event_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            worker_interval: Duration::from_secs(5),
            max_invocation_duration: Duration::from_secs(300), // 5 minutes
            stale_after: Duration::from_secs(600),
            sweep_interval: Duration::from_secs(60),
            event_capacity: 1024,
        }
    }
}

impl QueueConfig {
    /// Check the durations against each other.
    ///
    /// `stale_after` must exceed `max_invocation_duration`, otherwise the
    /// sweep fails jobs whose handler is still running.
    pub fn validate(&self) -> QueueResult<()> {
        for (name, value) in [
            ("worker_interval", self.worker_interval),
            ("max_invocation_duration", self.max_invocation_duration),
            ("sweep_interval", self.sweep_interval),
        ] {
            if value.is_zero() {
                return Err(QueueError::InvalidConfig(format!("{} must be non-zero", name)));
            }
        }
        if self.stale_after <= self.max_invocation_duration {
            return Err(QueueError::InvalidConfig(format!(
                "stale_after ({:?}) must exceed max_invocation_duration ({:?})",
                self.stale_after, self.max_invocation_duration
            )));
        }
        if self.event_capacity == 0 {
            return Err(QueueError::InvalidConfig(
                "event_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Handle for managing the scheduler lifecycle
pub struct WorkerHandle {
    shutdown_tx: oneshot::Sender<()>,
    join_handle: JoinHandle<QueueResult<()>>,
}

impl WorkerHandle {
    /// Stop the scheduler after any in-flight invocation finishes
    pub async fn shutdown(self) -> QueueResult<()> {
        let _ = self.shutdown_tx.send(());
        self.join_handle
            .await
            .map_err(|e| QueueError::Internal(format!("Scheduler join error: {}", e)))?
    }
}

/// Wires a store, a queue and the handler table into the producer, worker,
/// status and sweep components.
#[derive(Clone)]
pub struct QueueAdapter {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn JobQueue>,
    handlers: Arc<HandlerRegistry>,
    observability: Arc<ObservabilityLayer>,
    config: QueueConfig,
}

impl QueueAdapter {
    /// Create a new queue adapter with the default configuration
    pub fn new(store: Arc<dyn JobStore>, queue: Arc<dyn JobQueue>, handlers: HandlerRegistry) -> Self {
        Self::build(store, queue, handlers, QueueConfig::default())
    }

    /// Create adapter with custom configuration, rejected when it fails
    /// [`QueueConfig::validate`]
    pub fn with_config(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn JobQueue>,
        handlers: HandlerRegistry,
        config: QueueConfig,
    ) -> QueueResult<Self> {
        config.validate()?;
        Ok(Self::build(store, queue, handlers, config))
    }

    fn build(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn JobQueue>,
        handlers: HandlerRegistry,
        config: QueueConfig,
    ) -> Self {
        Self {
            store,
            queue,
            handlers: Arc::new(handlers),
            observability: Arc::new(ObservabilityLayer::with_capacity(config.event_capacity)),
            config,
        }
    }

    /// In-memory store and queue, for tests and single-process deployments
    pub fn in_memory(handlers: HandlerRegistry, config: QueueConfig) -> QueueResult<Self> {
        use crate::backend::memory::{MemoryJobQueue, MemoryJobStore};
        Self::with_config(
            Arc::new(MemoryJobStore::new()),
            Arc::new(MemoryJobQueue::new()),
            handlers,
            config,
        )
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            Arc::clone(&self.store),
            Arc::clone(&self.queue),
            Arc::clone(&self.observability),
        )
    }

    pub fn worker(&self) -> Worker {
        Worker::new(
            Arc::clone(&self.store),
            Arc::clone(&self.queue),
            Arc::clone(&self.handlers),
            Arc::clone(&self.observability),
        )
    }

    pub fn status_reader(&self) -> StatusReader {
        StatusReader::new(Arc::clone(&self.store))
    }

    pub fn sweeper(&self) -> StaleJobSweeper {
        StaleJobSweeper::new(
            Arc::clone(&self.store),
            Arc::clone(&self.observability),
            self.config.stale_after,
        )
    }

    /// Submit a job, see [`Orchestrator::submit`]
    pub async fn submit(&self, request: SubmitRequest) -> QueueResult<JobId> {
        self.orchestrator().submit(request).await
    }

    /// Look up a job, see [`StatusReader::status`]
    pub async fn status(&self, id: &str) -> QueueResult<JobStatusView> {
        self.status_reader().status(id).await
    }

    /// One worker invocation under the configured execution ceiling
    pub async fn run_worker_once(&self) -> QueueResult<WorkerOutcome> {
        self.worker()
            .run_once_bounded(self.config.max_invocation_duration)
            .await
    }

    /// One stale sweep pass
    pub async fn sweep(&self) -> QueueResult<SweepReport> {
        self.sweeper().sweep().await
    }

    /// Number of jobs waiting in the queue
    pub async fn queue_depth(&self) -> QueueResult<usize> {
        self.queue.len().await
    }

    /// Trigger the worker and the sweep on their intervals until shutdown.
    ///
    /// Each tick is an independent invocation; a slow one delays the next
    /// tick instead of overlapping it.
    #[instrument(skip(self))]
    pub fn start_scheduler(&self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let worker = self.worker();
        let sweeper = self.sweeper();
        let config = self.config.clone();

        let join_handle = tokio::spawn(async move {
            let mut worker_tick = tokio::time::interval(config.worker_interval);
            worker_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut sweep_tick = tokio::time::interval(config.sweep_interval);
            sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                "Scheduler started: worker every {:?}, sweep every {:?}",
                config.worker_interval, config.sweep_interval
            );

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        info!("Scheduler shutdown requested");
                        break;
                    }

                    _ = worker_tick.tick() => {
                        match worker.run_once_bounded(config.max_invocation_duration).await {
                            Ok(WorkerOutcome::Idle) => {}
                            Ok(outcome) => debug!("Worker invocation finished: {:?}", outcome),
                            Err(e) => error!("Worker invocation failed: {}", e),
                        }
                    }

                    _ = sweep_tick.tick() => {
                        if let Err(e) = sweeper.sweep().await {
                            warn!("Error during stale sweep: {}", e);
                        }
                    }
                }
            }

            info!("Scheduler stopped");
            Ok(())
        });

        WorkerHandle {
            shutdown_tx,
            join_handle,
        }
    }

    /// Get observability layer
    pub fn observability(&self) -> &ObservabilityLayer {
        &self.observability
    }

    /// Get configuration
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }
}
