use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::TaskKind;

/// Unique identifier for a job, `<task-prefix>-<uuid>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new unique job ID scoped by task kind
    pub fn for_task(task: TaskKind) -> Self {
        Self(format!("{}-{}", task.id_prefix(), Uuid::new_v4()))
    }

    /// Create a job ID from a string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
