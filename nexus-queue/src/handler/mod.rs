pub mod registry;

pub use registry::{HandlerRegistry, HandlerRegistryBuilder};

use std::future::Future;
use std::sync::Arc;
use async_trait::async_trait;
use serde_json::Value;

use crate::TaskError;

/// Work performed for one task kind.
///
/// Handlers only turn a payload into text. They never touch the job store;
/// recording status is the worker's job.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Run the task, returning its text output or a failure message
    async fn run(&self, payload: &Value) -> Result<String, TaskError>;
}

/// Handler backed by an async closure
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> TaskHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, TaskError>> + Send + 'static,
{
    async fn run(&self, payload: &Value) -> Result<String, TaskError> {
        (self.f)(payload.clone()).await
    }
}

/// Wrap an async closure as a shareable handler
///
/// ```rust
/// use nexus_queue::handler::handler_fn;
///
/// let handler = handler_fn(|_payload| async { Ok("OK".to_string()) });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn TaskHandler>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, TaskError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}
