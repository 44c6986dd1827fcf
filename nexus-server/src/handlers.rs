//! Task handlers for the three generation tasks.
//!
//! Every handler forwards `{ task, payload }` to a [`TextGenerator`] and
//! returns its text. Prompt building lives behind the generator.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use nexus_queue::{HandlerRegistry, TaskError, TaskHandler, TaskKind};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

/// Produces the text output of a task
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, task: TaskKind, payload: &Value) -> Result<String, TaskError>;
}

/// Posts the task to an HTTP endpoint and returns the response body
pub struct HttpTextGenerator {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpTextGenerator {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, task: TaskKind, payload: &Value) -> Result<String, TaskError> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&json!({ "task": task, "payload": payload }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TaskError::new(format!("Generator request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TaskError::new(format!("Failed to read generator response: {}", e)))?;

        if !status.is_success() {
            return Err(TaskError::new(format!("Generator error {}: {}", status, body)));
        }

        debug!("Generator returned {} bytes for {}", body.len(), task);
        Ok(body)
    }
}

/// Returns the payload as pretty JSON, for local runs without a generator
pub struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, _task: TaskKind, payload: &Value) -> Result<String, TaskError> {
        serde_json::to_string_pretty(payload).map_err(|e| TaskError::new(e.to_string()))
    }
}

/// Handler bound to one task kind
pub struct GenerateHandler {
    task: TaskKind,
    generator: Arc<dyn TextGenerator>,
}

#[async_trait]
impl TaskHandler for GenerateHandler {
    async fn run(&self, payload: &Value) -> Result<String, TaskError> {
        self.generator.generate(self.task, payload).await
    }
}

/// One handler per task kind, all sharing `generator`
pub fn registry(generator: Arc<dyn TextGenerator>) -> Result<HandlerRegistry> {
    let mut builder = HandlerRegistry::builder();
    for task in TaskKind::ALL {
        builder.register(
            task,
            Arc::new(GenerateHandler {
                task,
                generator: Arc::clone(&generator),
            }),
        )?;
    }
    Ok(builder.build()?)
}

/// HTTP generator when a URL is configured, echo otherwise
pub fn generator(url: Option<&str>, api_key: Option<String>) -> Arc<dyn TextGenerator> {
    match url {
        Some(url) => {
            info!("Using HTTP text generator at {}", url);
            Arc::new(HttpTextGenerator::new(url, api_key))
        }
        None => {
            info!("GENERATOR_URL not set, using echo generator");
            Arc::new(EchoGenerator)
        }
    }
}
