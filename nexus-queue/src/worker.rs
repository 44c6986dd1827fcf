use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    JobId, JobMessage, JobRecord, QueueError, QueueResult, TaskKind,
    backend::{JobQueue, JobStore},
    handler::HandlerRegistry,
    observability::ObservabilityLayer,
};

/// Result of one worker invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Queue was empty
    Idle,

    /// Handler returned and the job is `complete`
    Completed(JobId),

    /// Handler failed (or the task was unknown) and the job is `failed`
    Failed { job_id: JobId, error: String },

    /// Entry was dequeued but the stored job was not in a state this worker may advance
    Skipped(JobId),
}

impl WorkerOutcome {
    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::Idle => None,
            Self::Completed(job_id) | Self::Skipped(job_id) => Some(job_id),
            Self::Failed { job_id, .. } => Some(job_id),
        }
    }
}

/// Consumer side: pops one job per invocation, runs it, records the outcome.
///
/// Execution is at-most-once. The pop is destructive and nothing is requeued,
/// so an invocation that dies between dequeue and finalize leaves the job
/// `processing` until the stale sweep fails it.
#[derive(Clone)]
pub struct Worker {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn JobQueue>,
    handlers: Arc<HandlerRegistry>,
    observability: Arc<ObservabilityLayer>,
}

impl Worker {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn JobQueue>,
        handlers: Arc<HandlerRegistry>,
        observability: Arc<ObservabilityLayer>,
    ) -> Self {
        Self {
            store,
            queue,
            handlers,
            observability,
        }
    }

    /// Process at most one queued job
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> QueueResult<WorkerOutcome> {
        let message = match self.queue.pop().await? {
            Some(message) => message,
            None => {
                debug!("No jobs in queue");
                return Ok(WorkerOutcome::Idle);
            }
        };

        let job_id = message.id.clone();
        debug!("Processing job {} of type {}", job_id, message.task);

        let mut record = match self.store.get(&job_id).await? {
            Some(record) => record,
            None => {
                warn!(%job_id, "Queued job missing from store, rebuilding record from queue entry");
                JobRecord::from_message(&message)
            }
        };

        if let Err(e) = record.start_processing() {
            warn!(%job_id, "Skipping dequeued job: {}", e);
            return Ok(WorkerOutcome::Skipped(job_id));
        }
        self.store.set(&record).await?;
        self.observability.record_job_started(&job_id, &message.task);

        let started = Instant::now();
        let outcome = self.execute(&message).await;
        let elapsed = started.elapsed();

        self.finalize(&message, record, outcome, elapsed).await
    }

    /// Run one invocation under an execution ceiling.
    ///
    /// When the ceiling is hit the invocation is dropped where it stands, the
    /// same as a platform killing the process: the job stays `processing`.
    pub async fn run_once_bounded(&self, max_duration: Duration) -> QueueResult<WorkerOutcome> {
        match tokio::time::timeout(max_duration, self.run_once()).await {
            Ok(result) => result,
            Err(_) => {
                error!("Worker invocation exceeded {:?}, abandoning it", max_duration);
                Err(QueueError::InvocationTimedOut(max_duration))
            }
        }
    }

    async fn execute(&self, message: &JobMessage) -> Result<String, String> {
        let kind: TaskKind = match message.task.parse() {
            Ok(kind) => kind,
            Err(e) => return Err(e.to_string()),
        };

        let payload: &Value = &message.payload;
        match AssertUnwindSafe(self.handlers.dispatch(kind, payload))
            .catch_unwind()
            .await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(task_error)) => Err(task_error.message().to_string()),
            Err(panic) => Err(format!("Task handler panicked: {}", panic_message(&*panic))),
        }
    }

    async fn finalize(
        &self,
        message: &JobMessage,
        record: JobRecord,
        outcome: Result<String, String>,
        elapsed: Duration,
    ) -> QueueResult<WorkerOutcome> {
        let job_id = record.id.clone();

        let mut finished = record.clone();
        match &outcome {
            Ok(result) => finished.complete(result.clone())?,
            Err(error) => finished.fail(error.clone())?,
        }

        // The sweep may have failed the job while the handler ran
        if !self.store.compare_and_set(&record, &finished).await? {
            let current = self.store.get(&job_id).await?.map(|current| current.status);
            warn!(%job_id, ?current, "Discarding handler outcome, job changed while it ran");
            return Ok(WorkerOutcome::Skipped(job_id));
        }

        match outcome {
            Ok(_) => {
                self.observability
                    .record_job_completed(&job_id, &message.task, elapsed);
                info!("Job {} completed in {:?}", job_id, elapsed);
                Ok(WorkerOutcome::Completed(job_id))
            }
            Err(error) => {
                self.observability
                    .record_job_failed(&job_id, &message.task, &error);
                error!("Job {} failed: {}", job_id, error);
                Ok(WorkerOutcome::Failed { job_id, error })
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryJobQueue, MemoryJobStore};
    use crate::handler::handler_fn;
    use crate::{JobStatus, TaskError};
    use chrono::Utc;
    use serde_json::json;

    fn worker_with(registry: HandlerRegistry) -> (Worker, MemoryJobStore, MemoryJobQueue) {
        let store = MemoryJobStore::new();
        let queue = MemoryJobQueue::new();
        let worker = Worker::new(
            Arc::new(store.clone()),
            Arc::new(queue.clone()),
            Arc::new(registry),
            Arc::new(ObservabilityLayer::new()),
        );
        (worker, store, queue)
    }

    async fn enqueue(store: &MemoryJobStore, queue: &MemoryJobQueue, task: TaskKind) -> JobId {
        let record = JobRecord::new(task, json!({}));
        store.set(&record).await.unwrap();
        queue.push(&record.to_message()).await.unwrap();
        record.id
    }

    #[tokio::test]
    async fn empty_queue_is_idle() {
        let (worker, _, _) = worker_with(HandlerRegistry::uniform(handler_fn(|_| async {
            Ok("OK".to_string())
        })));
        assert_eq!(worker.run_once().await.unwrap(), WorkerOutcome::Idle);
    }

    #[tokio::test]
    async fn panicking_handler_is_recorded_as_failed() {
        let (worker, store, queue) = worker_with(HandlerRegistry::uniform(handler_fn(|_| async {
            if true {
                panic!("model exploded");
            }
            Ok(String::new())
        })));
        let id = enqueue(&store, &queue, TaskKind::ReverseNexusSearch).await;

        let outcome = worker.run_once().await.unwrap();
        assert!(matches!(outcome, WorkerOutcome::Failed { .. }));

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("Task handler panicked: model exploded"));
    }

    #[tokio::test]
    async fn unknown_task_in_queue_is_failed_not_left_processing() {
        let (worker, store, queue) = worker_with(HandlerRegistry::uniform(handler_fn(|_| async {
            Ok("OK".to_string())
        })));
        let message = JobMessage {
            id: JobId::from("legacy-1"),
            task: "fetchSymbiosisResponse".to_string(),
            payload: json!({}),
            created_at: Utc::now(),
        };
        queue.push(&message).await.unwrap();

        let outcome = worker.run_once().await.unwrap();
        assert_eq!(
            outcome,
            WorkerOutcome::Failed {
                job_id: JobId::from("legacy-1"),
                error: "Unknown task: fetchSymbiosisResponse".to_string(),
            }
        );

        // Record was rebuilt from the queue entry since the store never had it
        let record = store.get(&JobId::from("legacy-1")).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn already_terminal_job_is_skipped() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let (worker, store, queue) = worker_with(HandlerRegistry::uniform(handler_fn(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Ok("OK".to_string()) }
        })));

        let mut record = JobRecord::new(TaskKind::GenerateStrategicReport, json!({}));
        record.fail("swept").unwrap();
        store.set(&record).await.unwrap();
        queue.push(&record.to_message()).await.unwrap();

        assert_eq!(worker.run_once().await.unwrap(), WorkerOutcome::Skipped(record.id.clone()));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_error_message_is_kept_verbatim() {
        let (worker, store, queue) = worker_with(HandlerRegistry::uniform(handler_fn(|_| async {
            Err(TaskError::new("rate limited"))
        })));
        let id = enqueue(&store, &queue, TaskKind::GenerateStrategicReport).await;

        worker.run_once().await.unwrap();
        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.error.as_deref(), Some("rate limited"));
        assert!(record.result.is_none());
        assert!(record.completed_at.is_some());
    }

    #[tokio::test]
    async fn outcome_is_discarded_when_the_job_was_swept_while_running() {
        let store = MemoryJobStore::new();
        let queue = MemoryJobQueue::new();
        let sweep_store = store.clone();
        let registry = HandlerRegistry::uniform(handler_fn(move |_| {
            let store = sweep_store.clone();
            async move {
                // A sweep fails the job before the handler returns
                for mut record in store.list().await.map_err(|e| TaskError::new(e.to_string()))? {
                    let expected = record.clone();
                    record.fail("Job abandoned").map_err(|e| TaskError::new(e.to_string()))?;
                    store
                        .compare_and_set(&expected, &record)
                        .await
                        .map_err(|e| TaskError::new(e.to_string()))?;
                }
                Ok::<_, TaskError>("late result".to_string())
            }
        }));
        let worker = Worker::new(
            Arc::new(store.clone()),
            Arc::new(queue.clone()),
            Arc::new(registry),
            Arc::new(ObservabilityLayer::new()),
        );
        let id = enqueue(&store, &queue, TaskKind::GenerateStrategicReport).await;

        assert_eq!(worker.run_once().await.unwrap(), WorkerOutcome::Skipped(id.clone()));

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("Job abandoned"));
        assert!(record.result.is_none());
    }
}
