use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    JobId, QueueError, QueueResult,
    backend::JobStore,
    observability::ObservabilityLayer,
};

/// Outcome of one sweep pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Jobs stuck in processing that were failed by this pass
    pub abandoned: Vec<JobId>,

    /// Jobs pending for longer than the threshold, reported but left alone
    pub stale_pending: Vec<JobId>,
}

/// Fails orphaned jobs: records left `processing` by a worker invocation
/// that never finalized them.
///
/// Orphans are never requeued, so a handler still runs at most once.
#[derive(Clone)]
pub struct StaleJobSweeper {
    store: Arc<dyn JobStore>,
    observability: Arc<ObservabilityLayer>,
    stale_after: Duration,
}

impl StaleJobSweeper {
    pub fn new(
        store: Arc<dyn JobStore>,
        observability: Arc<ObservabilityLayer>,
        stale_after: Duration,
    ) -> Self {
        Self {
            store,
            observability,
            stale_after,
        }
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    /// Run one sweep pass
    pub async fn sweep(&self) -> QueueResult<SweepReport> {
        let now = Utc::now();
        let threshold = chrono::Duration::from_std(self.stale_after)
            .map_err(|e| QueueError::Internal(format!("Invalid stale threshold: {}", e)))?;

        let mut report = SweepReport::default();

        for record in self.store.list().await? {
            if record.pending_longer_than(threshold, now) {
                warn!(job_id = %record.id, "Job pending since {} without being processed", record.created_at);
                report.stale_pending.push(record.id);
                continue;
            }

            if !record.processing_longer_than(threshold, now) {
                continue;
            }

            debug!("Failing abandoned job: {}", record.id);
            let mut abandoned = record.clone();
            abandoned.fail(format!(
                "Job abandoned: exceeded maximum processing time of {:?}",
                self.stale_after
            ))?;

            // Only if no worker finalized the job since it was listed
            if !self.store.compare_and_set(&record, &abandoned).await? {
                debug!("Job {} changed during the sweep, leaving it", record.id);
                continue;
            }
            self.observability.record_job_abandoned(&abandoned.id, &abandoned.task);
            report.abandoned.push(abandoned.id);
        }

        if report.abandoned.is_empty() {
            debug!("No abandoned jobs found");
        } else {
            info!("Failed {} abandoned jobs", report.abandoned.len());
        }

        Ok(report)
    }
}
