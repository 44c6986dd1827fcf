//! # nexus-queue: asynchronous job orchestration for long-running AI tasks
//!
//! Long generation tasks run past the time budget of one request, so the
//! request path never runs them. A submission is validated, written to the
//! job store as `pending`, pushed onto a FIFO queue, and answered at once
//! with its job id. A worker invocation later pops one entry, runs the
//! matching [`handler::TaskHandler`] and records `complete` or `failed`.
//! Clients poll the store until the job is terminal.
//!
//! ```text
//! submit ──► JobStore (pending) ──► JobQueue ──► Worker ──► JobStore (complete | failed)
//!                     ▲                                              │
//!                     └──────────── StatusReader / poll ◄────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use nexus_queue::prelude::*;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> QueueResult<()> {
//! let handlers = HandlerRegistry::uniform(handler_fn(|_payload| async {
//!     Ok("Report text".to_string())
//! }));
//! let queue = QueueAdapter::in_memory(handlers, QueueConfig::default())?;
//!
//! let id = queue
//!     .submit(SubmitRequest::new("generateStrategicReport", json!({ "region": "Visayas" })))
//!     .await?;
//! assert_eq!(queue.status(id.as_str()).await?.status, JobStatus::Pending);
//!
//! queue.run_worker_once().await?;
//! assert_eq!(queue.status(id.as_str()).await?.result.as_deref(), Some("Report text"));
//! # Ok(())
//! # }
//! ```

pub mod types;
pub mod error;
pub mod backend;
pub mod handler;
pub mod orchestrator;
pub mod worker;
pub mod status;
pub mod sweep;
pub mod poll;
pub mod adapter;
pub mod observability;

pub use adapter::{QueueAdapter, QueueConfig, WorkerHandle};
pub use types::{JobEvent, JobId, JobMessage, JobRecord, JobStatus, TaskKind};
pub use error::{QueueError, QueueResult, TaskError};
pub use backend::{JobQueue, JobStore};
pub use handler::{handler_fn, HandlerRegistry, HandlerRegistryBuilder, TaskHandler};
pub use orchestrator::{Orchestrator, SubmitRequest};
pub use worker::{Worker, WorkerOutcome};
pub use status::{JobStatusView, StatusReader};
pub use sweep::{StaleJobSweeper, SweepReport};
pub use poll::{poll_until_terminal, poll_with, PollPolicy, StatusSource};

pub use observability::{LiveMetrics, MetricsSnapshot, ObservabilityLayer};

pub use backend::memory::{MemoryJobQueue, MemoryJobStore};

#[cfg(feature = "redis")]
pub use backend::redis::RedisBackend;

/// Everything needed to wire handlers and drive jobs
pub mod prelude {
    pub use crate::{
        QueueAdapter, QueueConfig, WorkerHandle,
        JobId, JobStatus, TaskKind, JobRecord,
        QueueError, QueueResult, TaskError,
        HandlerRegistry, TaskHandler, handler_fn,
        SubmitRequest, WorkerOutcome, JobStatusView,
        PollPolicy, StatusSource,
    };

    pub use async_trait::async_trait;
}
