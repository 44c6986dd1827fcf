use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JobId, JobStatus};

/// Lifecycle events published by the orchestrator, worker and sweeper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobEvent {
    /// Job was stored and queued
    Submitted {
        job_id: JobId,
        task: String,
        at: DateTime<Utc>,
    },

    /// Job was dequeued and marked processing
    Started {
        job_id: JobId,
        at: DateTime<Utc>,
    },

    /// Job completed successfully
    Completed {
        job_id: JobId,
        at: DateTime<Utc>,
    },

    /// Job failed permanently
    Failed {
        job_id: JobId,
        error: String,
        at: DateTime<Utc>,
    },

    /// Job was found stuck in processing and failed by the sweeper
    Abandoned {
        job_id: JobId,
        at: DateTime<Utc>,
    },
}

impl JobEvent {
    /// Get event type name as string
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "submitted",
            Self::Started { .. } => "started",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Abandoned { .. } => "abandoned",
        }
    }

    /// Get the job ID from any event
    pub fn job_id(&self) -> &JobId {
        match self {
            Self::Submitted { job_id, .. }
            | Self::Started { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::Failed { job_id, .. }
            | Self::Abandoned { job_id, .. } => job_id,
        }
    }

    /// Status the job holds after this event
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Submitted { .. } => JobStatus::Pending,
            Self::Started { .. } => JobStatus::Processing,
            Self::Completed { .. } => JobStatus::Complete,
            Self::Failed { .. } | Self::Abandoned { .. } => JobStatus::Failed,
        }
    }

    /// Get the timestamp from any event
    pub fn timestamp(&self) -> &DateTime<Utc> {
        match self {
            Self::Submitted { at, .. }
            | Self::Started { at, .. }
            | Self::Completed { at, .. }
            | Self::Failed { at, .. }
            | Self::Abandoned { at, .. } => at,
        }
    }
}
