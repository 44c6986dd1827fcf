use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::{JobId, JobRecord, JobStatus, QueueError, QueueResult, backend::JobStore};

/// What a polling client sees: `{ status, result?, error? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusView {
    pub status: JobStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusView {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl From<&JobRecord> for JobStatusView {
    fn from(record: &JobRecord) -> Self {
        Self {
            status: record.status,
            result: record.result.clone(),
            error: record.error.clone(),
        }
    }
}

/// Read-only lookups against the job store
#[derive(Clone)]
pub struct StatusReader {
    store: Arc<dyn JobStore>,
}

impl StatusReader {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Full stored record for `id`
    pub async fn record(&self, id: &str) -> QueueResult<JobRecord> {
        let id = id.trim();
        if id.is_empty() {
            return Err(QueueError::MissingJobId);
        }

        self.store
            .get(&JobId::from(id))
            .await?
            .ok_or_else(|| QueueError::JobNotFound(id.to_string()))
    }

    /// Current status of `id`, `JobNotFound` when it was never issued or has expired
    pub async fn status(&self, id: &str) -> QueueResult<JobStatusView> {
        self.record(id).await.map(|record| JobStatusView::from(&record))
    }
}
