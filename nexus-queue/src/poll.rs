//! Client-side polling until a job reaches a terminal state.
//!
//! Polling has no built-in upper bound on the server, so the poller carries
//! its own give-up threshold.

use std::time::Duration;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    QueueError, QueueResult,
    status::{JobStatusView, StatusReader},
};

/// Anything that can answer "what is the status of job `id`"
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, id: &str) -> QueueResult<JobStatusView>;
}

#[async_trait]
impl StatusSource for StatusReader {
    async fn fetch_status(&self, id: &str) -> QueueResult<JobStatusView> {
        self.status(id).await
    }
}

/// How often to poll and when to give up
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 150, // 5 minutes at the default interval
        }
    }
}

/// Poll `id` until it is `complete` or `failed`.
///
/// Transient errors are retried like a still-running job. Client errors and
/// `JobNotFound` end polling at once, since retrying cannot change them.
pub async fn poll_until_terminal<S>(
    source: &S,
    id: &str,
    policy: &PollPolicy,
) -> QueueResult<JobStatusView>
where
    S: StatusSource + ?Sized,
{
    poll_with(source, id, policy, |_| {}).await
}

/// Like [`poll_until_terminal`], calling `observe` with every status seen
pub async fn poll_with<S, F>(
    source: &S,
    id: &str,
    policy: &PollPolicy,
    mut observe: F,
) -> QueueResult<JobStatusView>
where
    S: StatusSource + ?Sized,
    F: FnMut(&JobStatusView) + Send,
{
    for attempt in 1..=policy.max_attempts {
        match source.fetch_status(id).await {
            Ok(view) => {
                observe(&view);
                if view.is_terminal() {
                    return Ok(view);
                }
                debug!(job_id = id, attempt, "Job still {}", view.status.name());
            }
            Err(e @ QueueError::JobNotFound(_)) => return Err(e),
            Err(e) if e.is_client_error() => return Err(e),
            Err(e) => warn!(job_id = id, attempt, "Polling error: {}", e),
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(QueueError::PollGaveUp {
        job_id: id.to_string(),
        attempts: policy.max_attempts,
    })
}
