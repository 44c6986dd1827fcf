pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

use async_trait::async_trait;
use futures_core::Stream;
use std::pin::Pin;

use crate::{JobId, JobMessage, JobRecord, QueueResult};

/// Type alias for boxed streams (stable Rust compatible)
pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send + 'static>>;

/// Keyed persistence for job records, the source of truth for status queries
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Fetch a record by id, `None` when it was never written or has expired
    async fn get(&self, id: &JobId) -> QueueResult<Option<JobRecord>>;

    /// Insert or overwrite the record stored under `record.id`
    async fn set(&self, record: &JobRecord) -> QueueResult<()>;

    /// Overwrite the stored record with `record` only while the stored copy
    /// still has the status and `started_at` of `expected`, as one atomic
    /// step. Returns `false` (and writes nothing) when another writer
    /// changed the job first or the record is gone.
    async fn compare_and_set(&self, expected: &JobRecord, record: &JobRecord) -> QueueResult<bool>;

    /// All known records (used by the stale-job sweep)
    async fn list(&self) -> QueueResult<Vec<JobRecord>>;
}

/// Ordered work queue: producers push at one end, workers pop at the other
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Push a message onto the pending end
    async fn push(&self, message: &JobMessage) -> QueueResult<()>;

    /// Atomically remove the oldest message, `None` when empty
    async fn pop(&self) -> QueueResult<Option<JobMessage>>;

    /// Number of messages waiting
    async fn len(&self) -> QueueResult<usize>;

    async fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len().await? == 0)
    }
}
