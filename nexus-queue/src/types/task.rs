use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::{QueueError, QueueResult};

/// Closed set of task kinds the queue knows how to dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    #[serde(rename = "generateStrategicReport")]
    GenerateStrategicReport,

    #[serde(rename = "generateOutreachLetter")]
    GenerateOutreachLetter,

    #[serde(rename = "reverseNexusSearch")]
    ReverseNexusSearch,
}

impl TaskKind {
    /// Every task kind, in registration order
    pub const ALL: [TaskKind; 3] = [
        TaskKind::GenerateStrategicReport,
        TaskKind::GenerateOutreachLetter,
        TaskKind::ReverseNexusSearch,
    ];

    /// Wire name of the task
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GenerateStrategicReport => "generateStrategicReport",
            Self::GenerateOutreachLetter => "generateOutreachLetter",
            Self::ReverseNexusSearch => "reverseNexusSearch",
        }
    }

    /// Prefix used when generating job ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::GenerateStrategicReport => "report",
            Self::GenerateOutreachLetter => "letter",
            Self::ReverseNexusSearch => "reverse",
        }
    }

    /// Payload fields the handler cannot work without
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::GenerateStrategicReport => &[],
            Self::GenerateOutreachLetter => &["reportContent", "userDetails"],
            Self::ReverseNexusSearch => &[],
        }
    }

    /// Check that a payload is an object carrying every required field
    pub fn validate_payload(&self, payload: &Value) -> QueueResult<()> {
        let object = payload.as_object().ok_or_else(|| {
            QueueError::InvalidPayload(format!("payload for {} must be a JSON object", self))
        })?;

        for field in self.required_fields() {
            match object.get(*field) {
                Some(value) if !value.is_null() => {}
                _ => {
                    return Err(QueueError::MissingPayloadField {
                        task: self.as_str().to_string(),
                        field: field.to_string(),
                    })
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| QueueError::UnknownTask(s.to_string()))
    }
}
