use anyhow::Result;
use nexus_server::{config::ServerConfig, logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;
    logging::init(config.log_format);

    let ax = nexus_server::build(&config).await?;
    let scheduler = ax.queue.start_scheduler();

    let addr = config.addr();
    info!("[nexus] listening on http://{addr}");

    tokio::select! {
        served = ax.listen(addr) => served?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    scheduler.shutdown().await?;
    Ok(())
}
