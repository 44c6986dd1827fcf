use async_trait::async_trait;
use nexus_queue::{
    poll_until_terminal, JobId, JobStatusView, PollPolicy, QueueError, QueueResult, StatusSource,
    SubmitRequest,
};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitReply {
    job_id: JobId,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for a running nexus server: submit a job, then poll it
#[derive(Clone)]
pub struct NexusClient {
    http: Client,
    base_url: String,
}

impl NexusClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Submit a job and return its id
    pub async fn submit(&self, task: &str, payload: Value) -> QueueResult<JobId> {
        let response = self
            .http
            .post(format!("{}/api/jobs", self.base_url))
            .json(&SubmitRequest::new(task, payload))
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::ACCEPTED | StatusCode::OK => {
                let reply: SubmitReply = response.json().await.map_err(transport)?;
                Ok(reply.job_id)
            }
            StatusCode::BAD_REQUEST => Err(QueueError::InvalidPayload(error_message(response).await)),
            status => Err(QueueError::Backend(format!(
                "Submit failed with {}: {}",
                status,
                error_message(response).await
            ))),
        }
    }

    /// Current status of a job
    pub async fn status(&self, id: &str) -> QueueResult<JobStatusView> {
        let response = self
            .http
            .get(format!("{}/api/job-status", self.base_url))
            .query(&[("id", id)])
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::OK => response.json().await.map_err(transport),
            StatusCode::BAD_REQUEST => Err(QueueError::MissingJobId),
            StatusCode::NOT_FOUND => Err(QueueError::JobNotFound(id.to_string())),
            status => Err(QueueError::Backend(format!(
                "Status check failed with {}: {}",
                status,
                error_message(response).await
            ))),
        }
    }

    /// Poll until the job is `complete` or `failed`
    pub async fn wait(&self, id: &str, policy: &PollPolicy) -> QueueResult<JobStatusView> {
        poll_until_terminal(self, id, policy).await
    }
}

#[async_trait]
impl StatusSource for NexusClient {
    async fn fetch_status(&self, id: &str) -> QueueResult<JobStatusView> {
        self.status(id).await
    }
}

fn transport(e: reqwest::Error) -> QueueError {
    QueueError::Backend(format!("Request to nexus server failed: {}", e))
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status.to_string(),
    }
}
