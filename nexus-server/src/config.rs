use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use nexus_queue::QueueConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Everything the server reads from its environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub queue: QueueConfig,
    pub redis_url: Option<String>,
    pub generator_url: Option<String>,
    pub generator_api_key: Option<String>,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
            queue: QueueConfig::default(),
            redis_url: None,
            generator_url: None,
            generator_api_key: None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    /// Load from process environment (call `dotenvy::dotenv()` first to pick up `.env`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key lookup; unset or empty values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        // HTTP Server Configuration
        let host = var("HTTP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse(&var, "HTTP_PORT", "3030")?;

        // Queue Configuration
        let queue = QueueConfig {
            worker_interval: seconds(&var, "WORKER_INTERVAL_SECS", "5")?,
            max_invocation_duration: seconds(&var, "WORKER_MAX_DURATION_SECS", "300")?,
            stale_after: seconds(&var, "STALE_JOB_AFTER_SECS", "600")?,
            sweep_interval: seconds(&var, "SWEEP_INTERVAL_SECS", "60")?,
            event_capacity: parse(&var, "EVENT_CAPACITY", "1024")?,
        };
        if queue.stale_after <= queue.max_invocation_duration {
            anyhow::bail!(
                "STALE_JOB_AFTER_SECS ({}) must be greater than WORKER_MAX_DURATION_SECS ({})",
                queue.stale_after.as_secs(),
                queue.max_invocation_duration.as_secs()
            );
        }
        queue.validate().context("Invalid queue configuration")?;

        let log_format = match var("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host,
            port,
            queue,
            redis_url: var("REDIS_URL"),
            generator_url: var("GENERATOR_URL"),
            generator_api_key: var("GENERATOR_API_KEY"),
            log_format,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T, F>(var: &F, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    let raw = var(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
}

fn seconds<F>(var: &F, key: &str, default: &str) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse(var, key, default)?;
    if secs == 0 {
        anyhow::bail!("{} must be greater than zero", key);
    }
    Ok(Duration::from_secs(secs))
}
