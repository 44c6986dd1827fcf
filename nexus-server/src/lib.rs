pub mod client;
pub mod config;
pub mod handlers;
pub mod logging;

use std::sync::Arc;

use anyhow::Result;
use nexus_axum::{axum, AxumApp};
use nexus_queue::{JobQueue, JobStore, MemoryJobQueue, MemoryJobStore, QueueAdapter};
use tracing::info;

pub use client::NexusClient;
pub use config::ServerConfig;

/// Wire handlers, backend and routes from `config`
pub async fn build(config: &ServerConfig) -> Result<AxumApp> {
    let generator = handlers::generator(
        config.generator_url.as_deref(),
        config.generator_api_key.clone(),
    );
    let registry = handlers::registry(generator)?;
    let (store, queue) = backend(config).await?;

    let queue = QueueAdapter::with_config(store, queue, registry, config.queue.clone())?;
    Ok(axum(queue))
}

async fn backend(config: &ServerConfig) -> Result<(Arc<dyn JobStore>, Arc<dyn JobQueue>)> {
    #[cfg(feature = "redis")]
    if let Some(url) = &config.redis_url {
        let redis = nexus_queue::RedisBackend::connect(url).await?;
        info!("Using Redis backend");
        let store: Arc<dyn JobStore> = Arc::new(redis.clone());
        let queue: Arc<dyn JobQueue> = Arc::new(redis);
        return Ok((store, queue));
    }

    #[cfg(not(feature = "redis"))]
    if config.redis_url.is_some() {
        tracing::warn!("REDIS_URL is set but the redis feature is disabled");
    }

    info!("Using in-memory backend");
    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    let queue: Arc<dyn JobQueue> = Arc::new(MemoryJobQueue::new());
    Ok((store, queue))
}
