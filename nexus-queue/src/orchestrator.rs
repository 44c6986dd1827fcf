use std::sync::Arc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    JobId, JobRecord, QueueResult, TaskKind,
    backend::{JobQueue, JobStore},
    observability::ObservabilityLayer,
};

/// Body of a submission: `{ task, payload }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub task: String,

    #[serde(default)]
    pub payload: Value,
}

impl SubmitRequest {
    pub fn new(task: impl Into<String>, payload: Value) -> Self {
        Self {
            task: task.into(),
            payload,
        }
    }
}

/// Producer side: validates, stores and queues submissions without running them
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn JobStore>,
    queue: Arc<dyn JobQueue>,
    observability: Arc<ObservabilityLayer>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        queue: Arc<dyn JobQueue>,
        observability: Arc<ObservabilityLayer>,
    ) -> Self {
        Self {
            store,
            queue,
            observability,
        }
    }

    /// Accept a submission and return its job id immediately.
    ///
    /// Performs exactly one store write and one queue push. Nothing here waits
    /// on the task handler.
    #[instrument(skip(self, request), fields(task = %request.task))]
    pub async fn submit(&self, request: SubmitRequest) -> QueueResult<JobId> {
        let task: TaskKind = request.task.parse()?;
        task.validate_payload(&request.payload)?;

        let record = JobRecord::new(task, request.payload);

        self.store.set(&record).await?;

        if let Err(e) = self.queue.push(&record.to_message()).await {
            // The record stays pending with no queue entry; the sweep reports it as stale
            warn!(job_id = %record.id, "Job stored but not queued: {}", e);
            return Err(e);
        }

        self.observability.record_job_submitted(&record.id, task.as_str());
        info!("Submitted job {} of type {}", record.id, task);
        Ok(record.id)
    }
}
