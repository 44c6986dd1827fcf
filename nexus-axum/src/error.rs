//! # Errors (Feathers-style)
//!
//! Every failing route answers with the same JSON shape:
//! `{ name, message, code, className }` plus optional `errors`.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nexus_queue::QueueError;
use serde_json::{json, Value};

/// Message sent for infrastructure failures; the details only go to the logs
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Feathers-ish error class names + status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,   // 400
    NotFound,     // 404
    GeneralError, // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::GeneralError => 500,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::GeneralError => "GeneralError",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotFound => "not-found",
            ErrorKind::GeneralError => "general-error",
        }
    }
}

/// A structured HTTP error that can live inside `anyhow::Error`.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub kind: ErrorKind,
    pub message: String,
    pub errors: Option<Value>,
}

impl HttpError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    /// Feathers-ish JSON payload.
    pub fn to_json(&self) -> Value {
        let mut base = json!({
            "name": self.kind.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.kind.class_name(),
        });
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind.name(), self.code(), self.message)
    }
}

impl std::error::Error for HttpError {}

impl From<&QueueError> for HttpError {
    fn from(err: &QueueError) -> Self {
        let message = err.to_string();
        match err {
            e if e.is_client_error() => HttpError::bad_request(message),
            QueueError::JobNotFound(_) => HttpError::not_found("Job not found"),
            _ => HttpError::general_error(INTERNAL_ERROR_MESSAGE),
        }
    }
}

#[derive(Debug)]
pub struct NexusAxumError(pub anyhow::Error);

impl From<anyhow::Error> for NexusAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<QueueError> for NexusAxumError {
    fn from(e: QueueError) -> Self {
        Self(anyhow::Error::new(e))
    }
}

impl From<HttpError> for NexusAxumError {
    fn from(e: HttpError) -> Self {
        Self(anyhow::Error::new(e))
    }
}

impl NexusAxumError {
    fn to_http(&self) -> HttpError {
        // Look through anyhow contexts for a structured error first
        if let Some(http) = self.0.chain().find_map(|e| e.downcast_ref::<HttpError>()) {
            return http.clone();
        }
        if let Some(queue) = self.0.chain().find_map(|e| e.downcast_ref::<QueueError>()) {
            return HttpError::from(queue);
        }
        HttpError::general_error(INTERNAL_ERROR_MESSAGE)
    }
}

impl IntoResponse for NexusAxumError {
    fn into_response(self) -> Response {
        let http = self.to_http();
        if http.kind == ErrorKind::GeneralError {
            tracing::error!("Request failed: {:#}", self.0);
        }
        let status = StatusCode::from_u16(http.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(http.to_json())).into_response()
    }
}
