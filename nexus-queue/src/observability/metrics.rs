use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use parking_lot::RwLock;
use serde::Serialize;

/// Live counters for queue operations
#[derive(Default)]
pub struct LiveMetrics {
    jobs_submitted: AtomicU64,
    jobs_started: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
    jobs_abandoned: AtomicU64,

    // Per-task metrics
    task_metrics: RwLock<HashMap<String, TaskMetrics>>,
}

impl LiveMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_task(&self, task: &str, update: impl FnOnce(&mut TaskMetrics)) {
        let mut metrics = self.task_metrics.write();
        update(metrics.entry(task.to_string()).or_default());
    }

    pub fn increment_jobs_submitted(&self, task: &str) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
        self.with_task(task, |m| m.submitted += 1);
    }

    pub fn increment_jobs_started(&self, task: &str) {
        self.jobs_started.fetch_add(1, Ordering::Relaxed);
        self.with_task(task, |m| m.started += 1);
    }

    pub fn increment_jobs_completed(&self, task: &str) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
        self.with_task(task, |m| m.completed += 1);
    }

    pub fn increment_jobs_failed(&self, task: &str) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
        self.with_task(task, |m| m.failed += 1);
    }

    pub fn increment_jobs_abandoned(&self, task: &str) {
        self.jobs_abandoned.fetch_add(1, Ordering::Relaxed);
        self.with_task(task, |m| m.abandoned += 1);
    }

    /// Record how long a handler ran
    pub fn record_execution_time(&self, task: &str, duration: Duration) {
        let millis = duration.as_millis() as u64;
        self.with_task(task, |m| {
            m.executions += 1;
            m.total_execution_ms += millis;
            m.max_execution_ms = m.max_execution_ms.max(millis);
        });
    }

    // Getters for global metrics
    pub fn jobs_submitted(&self) -> u64 {
        self.jobs_submitted.load(Ordering::Relaxed)
    }

    pub fn jobs_started(&self) -> u64 {
        self.jobs_started.load(Ordering::Relaxed)
    }

    pub fn jobs_completed(&self) -> u64 {
        self.jobs_completed.load(Ordering::Relaxed)
    }

    pub fn jobs_failed(&self) -> u64 {
        self.jobs_failed.load(Ordering::Relaxed)
    }

    pub fn jobs_abandoned(&self) -> u64 {
        self.jobs_abandoned.load(Ordering::Relaxed)
    }

    /// Get metrics for a specific task
    pub fn task_metrics(&self, task: &str) -> Option<TaskMetrics> {
        self.task_metrics.read().get(task).cloned()
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.jobs_submitted(),
            started: self.jobs_started(),
            completed: self.jobs_completed(),
            failed: self.jobs_failed(),
            abandoned: self.jobs_abandoned(),
            tasks: self.task_metrics.read().clone(),
        }
    }
}

/// Metrics for a specific task kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetrics {
    pub submitted: u64,
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    pub abandoned: u64,
    pub executions: u64,
    pub total_execution_ms: u64,
    pub max_execution_ms: u64,
}

impl TaskMetrics {
    /// Mean handler duration, zero before the first execution
    pub fn average_execution_ms(&self) -> u64 {
        if self.executions == 0 {
            0
        } else {
            self.total_execution_ms / self.executions
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    pub abandoned: u64,
    pub tasks: HashMap<String, TaskMetrics>,
}
