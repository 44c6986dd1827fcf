use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use nexus_axum::{axum as nexus_axum_app, AxumApp};
use nexus_queue::{MemoryJobQueue, MemoryJobStore, QueueAdapter, TaskError, TaskKind};
use nexus_server::handlers::{self, TextGenerator};
use nexus_server::{build, ServerConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn app() -> AxumApp {
    build(&ServerConfig::default()).await.unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

/// Generator that always reports the provider as rate limited
struct RateLimited;

#[async_trait]
impl TextGenerator for RateLimited {
    async fn generate(&self, _task: TaskKind, _payload: &Value) -> Result<String, TaskError> {
        Err(TaskError::new("rate limited"))
    }
}

#[tokio::test]
async fn health_ok() {
    let ax = app().await;

    let res = ax.router.oneshot(get("/health")).await.unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "ok");
}

#[tokio::test]
async fn report_is_accepted_then_completed_by_the_worker() {
    let ax = app().await;

    let res = ax
        .router
        .clone()
        .oneshot(post(
            "/api/jobs",
            json!({ "task": "generateStrategicReport", "payload": { "region": "Bicol" } }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 202);
    assert!(res.headers().get("x-request-id").is_some());
    let job_id = json_body(res).await["jobId"].as_str().unwrap().to_string();
    assert!(job_id.starts_with("report-"));

    let status_uri = format!("/api/job-status?id={}", job_id);
    let res = ax.router.clone().oneshot(get(&status_uri)).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await, json!({ "status": "pending" }));

    let res = ax.router.clone().oneshot(post("/api/worker", json!({}))).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["outcome"], "completed");
    assert_eq!(body["jobId"], job_id.as_str());

    let res = ax.router.clone().oneshot(get(&status_uri)).await.unwrap();
    let body = json_body(res).await;
    assert_eq!(body["status"], "complete");
    assert!(body["result"].as_str().unwrap().contains("Bicol"));
    assert!(body.get("error").is_none());

    let res = ax.router.oneshot(post("/api/worker", json!({}))).await.unwrap();
    assert_eq!(json_body(res).await, json!({ "outcome": "idle" }));
}

#[tokio::test]
async fn unknown_task_is_rejected_and_fabricated_id_not_found() {
    let ax = app().await;

    let res = ax
        .router
        .clone()
        .oneshot(post("/api/jobs", json!({ "task": "unknownTask", "payload": {} })))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
    assert_eq!(body["message"], "Unknown task: unknownTask");
    assert!(body.get("jobId").is_none());

    let res = ax
        .router
        .clone()
        .oneshot(get("/api/job-status?id=report-fabricated"))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);
    let body = json_body(res).await;
    assert_eq!(body["name"], "NotFound");
    assert_eq!(body["message"], "Job not found");

    let res = ax.router.oneshot(get("/api/queue/stats")).await.unwrap();
    let body = json_body(res).await;
    assert_eq!(body["submitted"], 0);
    assert_eq!(body["queueDepth"], 0);
}

#[tokio::test]
async fn handler_failure_is_reported_through_status() {
    let registry = handlers::registry(Arc::new(RateLimited)).unwrap();
    let queue = QueueAdapter::new(
        Arc::new(MemoryJobStore::new()),
        Arc::new(MemoryJobQueue::new()),
        registry,
    );
    let ax = nexus_axum_app(queue);

    let res = ax
        .router
        .clone()
        .oneshot(post(
            "/api/jobs",
            json!({
                "task": "generateOutreachLetter",
                "payload": { "reportContent": "...", "userDetails": { "name": "Ana" } }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 202);
    let job_id = json_body(res).await["jobId"].as_str().unwrap().to_string();
    assert!(job_id.starts_with("letter-"));

    let res = ax.router.clone().oneshot(post("/api/worker", json!({}))).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert_eq!(body["outcome"], "failed");
    assert_eq!(body["error"], "rate limited");

    let res = ax
        .router
        .clone()
        .oneshot(get(&format!("/api/job-status?id={}", job_id)))
        .await
        .unwrap();
    assert_eq!(
        json_body(res).await,
        json!({ "status": "failed", "error": "rate limited" })
    );

    let res = ax.router.oneshot(get("/api/queue/stats")).await.unwrap();
    let body = json_body(res).await;
    assert_eq!(body["submitted"], 1);
    assert_eq!(body["failed"], 1);
}

#[tokio::test]
async fn sweep_route_reports_nothing_on_a_fresh_queue() {
    let ax = app().await;

    let res = ax.router.oneshot(post("/api/worker/sweep", json!({}))).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(
        json_body(res).await,
        json!({ "abandoned": [], "stalePending": [] })
    );
}
