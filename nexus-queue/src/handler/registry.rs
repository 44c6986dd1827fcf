use std::collections::HashMap;
use std::sync::Arc;
use serde_json::Value;

use super::TaskHandler;
use crate::{QueueError, QueueResult, TaskError, TaskKind};

/// Table mapping every task kind to exactly one handler.
///
/// Only [`HandlerRegistryBuilder::build`] creates one, and it refuses to
/// build while any [`TaskKind`] is unhandled, so dispatch cannot miss at runtime.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Registry that routes every task kind to the same handler
    pub fn uniform(handler: Arc<dyn TaskHandler>) -> Self {
        let handlers = TaskKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::clone(&handler)))
            .collect();
        Self { handlers }
    }

    /// Get the handler for a task kind
    pub fn handler(&self, kind: TaskKind) -> QueueResult<Arc<dyn TaskHandler>> {
        self.handlers
            .get(&kind)
            .cloned()
            .ok_or_else(|| QueueError::MissingHandler(kind.to_string()))
    }

    /// Run the handler registered for `kind`
    pub async fn dispatch(&self, kind: TaskKind, payload: &Value) -> Result<String, TaskError> {
        let handler = self
            .handler(kind)
            .map_err(|e| TaskError::new(e.to_string()))?;
        handler.run(payload).await
    }

    /// Get all registered task kinds
    pub fn registered_kinds(&self) -> Vec<TaskKind> {
        TaskKind::ALL
            .into_iter()
            .filter(|kind| self.handlers.contains_key(kind))
            .collect()
    }
}

/// Collects handlers before the exhaustiveness check
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl HandlerRegistryBuilder {
    /// Register the handler for one task kind
    pub fn register(&mut self, kind: TaskKind, handler: Arc<dyn TaskHandler>) -> QueueResult<&mut Self> {
        if self.handlers.contains_key(&kind) {
            return Err(QueueError::Internal(format!("Handler for '{}' already registered", kind)));
        }
        self.handlers.insert(kind, handler);
        Ok(self)
    }

    /// Finish the table, failing on the first task kind without a handler
    pub fn build(self) -> QueueResult<HandlerRegistry> {
        if let Some(missing) = TaskKind::ALL
            .into_iter()
            .find(|kind| !self.handlers.contains_key(kind))
        {
            return Err(QueueError::MissingHandler(missing.to_string()));
        }
        Ok(HandlerRegistry {
            handlers: self.handlers,
        })
    }
}
