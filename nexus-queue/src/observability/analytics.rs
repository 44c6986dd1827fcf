use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::debug;

use crate::{JobEvent, JobId, backend::BoxStream};
use super::LiveMetrics;

/// Event bus plus live counters shared by orchestrator, worker and sweeper
#[derive(Clone)]
pub struct ObservabilityLayer {
    event_broadcaster: broadcast::Sender<JobEvent>,
    metrics: Arc<LiveMetrics>,
}

impl ObservabilityLayer {
    /// Create new observability layer
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a layer whose event buffer holds `capacity` events per subscriber
    pub fn with_capacity(capacity: usize) -> Self {
        let (event_broadcaster, _) = broadcast::channel(capacity.max(1));

        Self {
            event_broadcaster,
            metrics: Arc::new(LiveMetrics::new()),
        }
    }

    fn publish(&self, event: JobEvent) {
        // No subscribers is not an error
        let _ = self.event_broadcaster.send(event);
    }

    pub fn record_job_submitted(&self, job_id: &JobId, task: &str) {
        self.publish(JobEvent::Submitted {
            job_id: job_id.clone(),
            task: task.to_string(),
            at: Utc::now(),
        });
        self.metrics.increment_jobs_submitted(task);
        debug!("Recorded job submitted: {} ({})", job_id, task);
    }

    pub fn record_job_started(&self, job_id: &JobId, task: &str) {
        self.publish(JobEvent::Started {
            job_id: job_id.clone(),
            at: Utc::now(),
        });
        self.metrics.increment_jobs_started(task);
        debug!("Recorded job started: {} ({})", job_id, task);
    }

    pub fn record_job_completed(&self, job_id: &JobId, task: &str, elapsed: Duration) {
        self.publish(JobEvent::Completed {
            job_id: job_id.clone(),
            at: Utc::now(),
        });
        self.metrics.increment_jobs_completed(task);
        self.metrics.record_execution_time(task, elapsed);
        debug!("Recorded job completed: {} ({})", job_id, task);
    }

    pub fn record_job_failed(&self, job_id: &JobId, task: &str, error: &str) {
        self.publish(JobEvent::Failed {
            job_id: job_id.clone(),
            error: error.to_string(),
            at: Utc::now(),
        });
        self.metrics.increment_jobs_failed(task);
        debug!("Recorded job failed: {} ({})", job_id, task);
    }

    pub fn record_job_abandoned(&self, job_id: &JobId, task: &str) {
        self.publish(JobEvent::Abandoned {
            job_id: job_id.clone(),
            at: Utc::now(),
        });
        self.metrics.increment_jobs_abandoned(task);
        debug!("Recorded job abandoned: {} ({})", job_id, task);
    }

    /// Raw broadcast receiver
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.event_broadcaster.subscribe()
    }

    /// Event stream that skips over lagged gaps
    pub fn event_stream(&self) -> BoxStream<JobEvent> {
        let stream = BroadcastStream::new(self.event_broadcaster.subscribe())
            .filter_map(|result| result.ok());
        Box::pin(stream)
    }

    /// Get live metrics
    pub fn metrics(&self) -> &LiveMetrics {
        &self.metrics
    }
}

impl Default for ObservabilityLayer {
    fn default() -> Self {
        Self::new()
    }
}
