use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::JobId;

/// Job message - immutable submission snapshot held by the queue
///
/// `task` stays a raw string so that entries pushed by other producers can
/// still be dequeued and failed with a readable error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMessage {
    pub id: JobId,

    pub task: String,

    #[serde(default)]
    pub payload: Value,

    pub created_at: DateTime<Utc>,
}
