//! nexus-axum: HTTP surface for nexus-queue.
//!
//! `POST /api/jobs`, `GET /api/job-status?id=`, `POST /api/worker`,
//! `POST /api/worker/sweep`, `GET /api/queue/stats` and `GET /health`.
//! Failures answer with a Feathers-style JSON body and every response
//! carries an `x-request-id`.

pub mod app;
pub mod error;
pub mod rest;
pub mod state;

pub use error::{HttpError, NexusAxumError, INTERNAL_ERROR_MESSAGE};
pub use state::NexusAxumState;

pub use app::{axum, AxumApp};
