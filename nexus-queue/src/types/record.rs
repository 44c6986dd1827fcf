use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{JobId, JobMessage, TaskKind};
use crate::{QueueError, QueueResult};

/// Job status lifecycle: pending -> processing -> complete | failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job is stored and queued, no worker has picked it up yet
    Pending,

    /// A worker dequeued the job and is running its handler
    Processing,

    /// Handler returned a result
    Complete,

    /// Handler failed, the job was undecodable, or it was abandoned
    Failed,
}

impl JobStatus {
    /// Check if the job is in a terminal state (complete or failed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Whether moving from `self` to `next` respects forward-only ordering
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Failed)
                | (Self::Processing, Self::Complete)
                | (Self::Processing, Self::Failed)
        )
    }

    /// Position in the lifecycle, terminal states share the last rank
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Complete | Self::Failed => 2,
        }
    }

    /// Get the status name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

/// Job record - the durable source of truth kept in the job store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: JobId,

    pub status: JobStatus,

    /// Wire discriminator of the task
    pub task: String,

    /// Task input, opaque to the queue
    pub payload: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Create a new pending record with a fresh id
    pub fn new(task: TaskKind, payload: Value) -> Self {
        Self {
            id: JobId::for_task(task),
            status: JobStatus::Pending,
            task: task.as_str().to_string(),
            payload,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Rebuild a pending record from the queued snapshot
    pub fn from_message(message: &JobMessage) -> Self {
        Self {
            id: message.id.clone(),
            status: JobStatus::Pending,
            task: message.task.clone(),
            payload: message.payload.clone(),
            result: None,
            error: None,
            created_at: message.created_at,
            started_at: None,
            completed_at: None,
        }
    }

    /// Snapshot pushed onto the queue
    pub fn to_message(&self) -> JobMessage {
        JobMessage {
            id: self.id.clone(),
            task: self.task.clone(),
            payload: self.payload.clone(),
            created_at: self.created_at,
        }
    }

    /// Parse the task discriminator
    pub fn task_kind(&self) -> QueueResult<TaskKind> {
        self.task.parse()
    }

    fn transition(&mut self, next: JobStatus) -> QueueResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(QueueError::InvalidTransition {
                job_id: self.id.to_string(),
                from: self.status.name(),
                to: next.name(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Mark the record as picked up by a worker
    pub fn start_processing(&mut self) -> QueueResult<()> {
        self.transition(JobStatus::Processing)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Complete the job with the handler's output
    pub fn complete(&mut self, result: String) -> QueueResult<()> {
        self.transition(JobStatus::Complete)?;
        self.result = Some(result);
        self.error = None;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Fail the job permanently
    pub fn fail(&mut self, error: impl Into<String>) -> QueueResult<()> {
        self.transition(JobStatus::Failed)?;
        self.error = Some(error.into());
        self.result = None;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Check if the record has been processing for longer than `threshold`
    pub fn processing_longer_than(&self, threshold: chrono::Duration, now: DateTime<Utc>) -> bool {
        match (self.status, self.started_at) {
            (JobStatus::Processing, Some(started_at)) => now - started_at > threshold,
            // A processing record without a start time was written by another producer
            (JobStatus::Processing, None) => now - self.created_at > threshold,
            _ => false,
        }
    }

    /// Check if the record has waited in pending for longer than `threshold`
    pub fn pending_longer_than(&self, threshold: chrono::Duration, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Pending && now - self.created_at > threshold
    }
}
