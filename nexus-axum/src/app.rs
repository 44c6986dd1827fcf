use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use nexus_queue::QueueAdapter;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::rest;
use crate::NexusAxumState;

/// The queue plus the router that serves it
#[derive(Clone)]
pub struct AxumApp {
    pub queue: Arc<QueueAdapter>,
    pub router: Router<()>,
}

impl AxumApp {
    pub fn new(queue: QueueAdapter) -> Self {
        let state = NexusAxumState::new(queue);
        let queue = Arc::clone(&state.queue);

        let router = Router::new()
            .nest("/api", rest::jobs_router(state))
            .route("/health", get(|| async { "ok" }));

        Self { queue, router }.with_http_layers()
    }

    /// Request ids are generated when absent and echoed back on every response
    fn with_http_layers(mut self) -> Self {
        self.router = self.router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        );
        self
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

pub fn axum(queue: QueueAdapter) -> AxumApp {
    AxumApp::new(queue)
}
