use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::{
    JobId, JobMessage, JobRecord, QueueResult,
    backend::{JobQueue, JobStore},
};

/// In-memory job store for tests and single-process deployments
#[derive(Clone, Default)]
pub struct MemoryJobStore {
    /// Job records indexed by job id
    pub(crate) jobs: Arc<RwLock<HashMap<JobId, JobRecord>>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get(&self, id: &JobId) -> QueueResult<Option<JobRecord>> {
        Ok(self.jobs.read().get(id).cloned())
    }

    async fn set(&self, record: &JobRecord) -> QueueResult<()> {
        self.jobs.write().insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn compare_and_set(&self, expected: &JobRecord, record: &JobRecord) -> QueueResult<bool> {
        let mut jobs = self.jobs.write();
        match jobs.get(&record.id) {
            Some(current)
                if current.status == expected.status
                    && current.started_at == expected.started_at =>
            {
                jobs.insert(record.id.clone(), record.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self) -> QueueResult<Vec<JobRecord>> {
        Ok(self.jobs.read().values().cloned().collect())
    }
}

/// In-memory FIFO queue: push to the front, pop from the back
#[derive(Clone, Default)]
pub struct MemoryJobQueue {
    pub(crate) entries: Arc<Mutex<VecDeque<JobMessage>>>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn push(&self, message: &JobMessage) -> QueueResult<()> {
        self.entries.lock().push_front(message.clone());
        Ok(())
    }

    async fn pop(&self) -> QueueResult<Option<JobMessage>> {
        Ok(self.entries.lock().pop_back())
    }

    async fn len(&self) -> QueueResult<usize> {
        Ok(self.entries.lock().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskKind;
    use serde_json::json;

    fn message(task: TaskKind) -> JobMessage {
        JobRecord::new(task, json!({})).to_message()
    }

    #[tokio::test]
    async fn queue_pops_in_push_order() {
        let queue = MemoryJobQueue::new();
        let first = message(TaskKind::GenerateStrategicReport);
        let second = message(TaskKind::ReverseNexusSearch);

        queue.push(&first).await.unwrap();
        queue.push(&second).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 2);

        assert_eq!(queue.pop().await.unwrap().unwrap().id, first.id);
        assert_eq!(queue.pop().await.unwrap().unwrap().id, second.id);
        assert!(queue.pop().await.unwrap().is_none());
        assert!(queue.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_pops_never_share_an_entry() {
        let queue = MemoryJobQueue::new();
        for _ in 0..50 {
            queue.push(&message(TaskKind::GenerateStrategicReport)).await.unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..8 {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(message) = queue.pop().await.unwrap() {
                    seen.push(message.id);
                }
                seen
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        let unique: std::collections::HashSet<_> = all.iter().cloned().collect();
        assert_eq!(all.len(), 50);
        assert_eq!(unique.len(), 50);
    }

    #[tokio::test]
    async fn store_overwrites_by_id() {
        let store = MemoryJobStore::new();
        let mut record = JobRecord::new(TaskKind::GenerateStrategicReport, json!({}));
        store.set(&record).await.unwrap();

        record.start_processing().unwrap();
        store.set(&record).await.unwrap();

        assert_eq!(store.len(), 1);
        let stored = store.get(&record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, crate::JobStatus::Processing);
        assert!(store.get(&JobId::from("report-missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn compare_and_set_refuses_a_changed_record() {
        let store = MemoryJobStore::new();
        let mut processing = JobRecord::new(TaskKind::GenerateStrategicReport, json!({}));
        processing.start_processing().unwrap();
        store.set(&processing).await.unwrap();

        let mut complete = processing.clone();
        complete.complete("OK".to_string()).unwrap();
        assert!(store.compare_and_set(&processing, &complete).await.unwrap());

        let mut failed = processing.clone();
        failed.fail("abandoned").unwrap();
        assert!(!store.compare_and_set(&processing, &failed).await.unwrap());

        let stored = store.get(&processing.id).await.unwrap().unwrap();
        assert_eq!(stored.status, crate::JobStatus::Complete);
        assert_eq!(stored.result.as_deref(), Some("OK"));

        let missing = JobRecord::new(TaskKind::ReverseNexusSearch, json!({}));
        assert!(!store.compare_and_set(&missing, &missing).await.unwrap());
        assert_eq!(store.len(), 1);
    }
}
