use thiserror::Error;

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Infrastructure and validation errors for queue operations
#[derive(Error, Debug, Clone)]
pub enum QueueError {
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Missing required payload field '{field}' for task {task}")]
    MissingPayloadField { task: String, field: String },

    #[error("Job ID required")]
    MissingJobId,

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid status transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("No handler registered for task: {0}")]
    MissingHandler(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Worker invocation exceeded maximum duration of {0:?}")]
    InvocationTimedOut(std::time::Duration),

    #[error("Gave up polling job {job_id} after {attempts} attempts")]
    PollGaveUp { job_id: String, attempts: u32 },

    #[error("Invalid queue configuration: {0}")]
    InvalidConfig(String),

    #[error("Worker shutdown")]
    WorkerShutdown,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueueError {
    /// True for errors caused by the submitter rather than the infrastructure
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTask(_)
                | Self::InvalidPayload(_)
                | Self::MissingPayloadField { .. }
                | Self::MissingJobId
        )
    }
}

/// Failure reported by a task handler.
///
/// The message is recorded on the job verbatim, so `Display` is the message only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TaskError {
    message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for TaskError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for TaskError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}
