use std::collections::HashMap;

use axum::{
    extract::rejection::JsonRejection,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use nexus_queue::{JobId, MetricsSnapshot, SubmitRequest, SweepReport, WorkerOutcome};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::{error::HttpError, NexusAxumError, NexusAxumState};

fn map_json_rejection(rejection: JsonRejection) -> NexusAxumError {
    HttpError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.to_string()]}))
        .into()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReply {
    pub job_id: JobId,
}

/// Body of `POST /worker`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerReply {
    pub outcome: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<WorkerOutcome> for WorkerReply {
    fn from(outcome: WorkerOutcome) -> Self {
        match outcome {
            WorkerOutcome::Idle => Self {
                outcome: "idle",
                job_id: None,
                error: None,
            },
            WorkerOutcome::Completed(job_id) => Self {
                outcome: "completed",
                job_id: Some(job_id),
                error: None,
            },
            WorkerOutcome::Failed { job_id, error } => Self {
                outcome: "failed",
                job_id: Some(job_id),
                error: Some(error),
            },
            WorkerOutcome::Skipped(job_id) => Self {
                outcome: "skipped",
                job_id: Some(job_id),
                error: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReply {
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
    pub queue_depth: usize,
}

/// Routes mounted under `/api`
pub fn jobs_router(state: NexusAxumState) -> Router<()> {
    Router::new()
        .route(
            "/jobs",
            post(
                |State(state): State<NexusAxumState>,
                 body: Result<Json<SubmitRequest>, JsonRejection>| async move {
                    let Json(request) = body.map_err(map_json_rejection)?;
                    let job_id = state.queue.submit(request).await?;
                    Ok::<_, NexusAxumError>((StatusCode::ACCEPTED, Json(SubmitReply { job_id })))
                },
            ),
        )
        .route(
            "/job-status",
            get(
                |State(state): State<NexusAxumState>,
                 Query(query): Query<HashMap<String, String>>| async move {
                    let id = query.get("id").map(String::as_str).unwrap_or_default();
                    let view = state.queue.status(id).await?;
                    Ok::<_, NexusAxumError>(Json(view))
                },
            ),
        )
        .route(
            "/worker",
            post(|State(state): State<NexusAxumState>| async move {
                let outcome = state.queue.run_worker_once().await?;
                debug!("Worker trigger finished: {:?}", outcome);
                Ok::<_, NexusAxumError>(Json(WorkerReply::from(outcome)))
            }),
        )
        .route(
            "/worker/sweep",
            post(|State(state): State<NexusAxumState>| async move {
                let report: SweepReport = state.queue.sweep().await?;
                Ok::<_, NexusAxumError>(Json(report))
            }),
        )
        .route(
            "/queue/stats",
            get(|State(state): State<NexusAxumState>| async move {
                let queue_depth = state.queue.queue_depth().await?;
                let metrics = state.queue.observability().metrics().snapshot();
                Ok::<_, NexusAxumError>(Json(StatsReply {
                    metrics,
                    queue_depth,
                }))
            }),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_reply_has_no_job_id() {
        let body = serde_json::to_value(WorkerReply::from(WorkerOutcome::Idle)).unwrap();
        assert_eq!(body, json!({ "outcome": "idle" }));
    }

    #[test]
    fn failed_reply_carries_the_error() {
        let body = serde_json::to_value(WorkerReply::from(WorkerOutcome::Failed {
            job_id: JobId::from("letter-1"),
            error: "rate limited".to_string(),
        }))
        .unwrap();
        assert_eq!(
            body,
            json!({ "outcome": "failed", "jobId": "letter-1", "error": "rate limited" })
        );
    }
}
