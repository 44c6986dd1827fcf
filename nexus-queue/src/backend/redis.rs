//! Redis-backed store and queue.
//!
//! Layout:
//! - queue: list `nexus_job_queue`, LPUSH by producers, RPOP by workers
//! - store: string `nexus:job:<id>` holding the JSON record
//! - index: set `nexus:jobs` of every stored id, read by the stale sweep

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tracing::{error, instrument, warn};

use crate::{
    JobId, JobMessage, JobRecord, JobStatus, QueueError, QueueResult,
    backend::{JobQueue, JobStore},
};

pub const QUEUE_KEY: &str = "nexus_job_queue";
pub const JOB_INDEX_KEY: &str = "nexus:jobs";
const JOB_KEY_PREFIX: &str = "nexus:job:";

/// KEYS: job key, index key. ARGV: expected status, expected startedAt
/// (empty when unset), new record JSON, job id.
const COMPARE_AND_SET: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then
    return 0
end
local current = cjson.decode(raw)
local started = current['startedAt']
if type(started) ~= 'string' then
    started = ''
end
if current['status'] ~= ARGV[1] or started ~= ARGV[2] then
    return 0
end
redis.call('SET', KEYS[1], ARGV[3])
redis.call('SADD', KEYS[2], ARGV[4])
return 1
"#;

/// Store and queue sharing one multiplexed Redis connection
#[derive(Clone)]
pub struct RedisBackend {
    manager: ConnectionManager,
}

impl RedisBackend {
    /// Connect to the Redis server at `url` (e.g. `redis://127.0.0.1/`)
    pub async fn connect(url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }

    fn job_key(id: &JobId) -> String {
        format!("{}{}", JOB_KEY_PREFIX, id)
    }

    /// Fail the pending record behind a queue entry that was popped but
    /// could not be decoded, so its status does not stay `pending` forever.
    async fn fail_undecodable(&self, id: &JobId, cause: &serde_json::Error) {
        let result: QueueResult<bool> = async {
            let Some(record) = self.get(id).await? else {
                return Ok(false);
            };
            if record.status != JobStatus::Pending {
                return Ok(false);
            }
            let mut failed = record.clone();
            failed.fail(format!("Undecodable queue entry: {}", cause))?;
            self.compare_and_set(&record, &failed).await
        }
        .await;

        match result {
            Ok(true) => warn!(job_id = %id, "Failed job with undecodable queue entry"),
            Ok(false) => {}
            Err(e) => error!(job_id = %id, "Could not fail job with undecodable queue entry: {}", e),
        }
    }
}

/// Id carried by a queue entry that no longer decodes as a [`JobMessage`]
fn entry_id(raw: &str) -> Option<JobId> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    value.get("id")?.as_str().map(JobId::from)
}

#[async_trait]
impl JobStore for RedisBackend {
    async fn get(&self, id: &JobId) -> QueueResult<Option<JobRecord>> {
        let mut con = self.manager.clone();
        let raw: Option<String> = con.get(Self::job_key(id)).await?;
        raw.map(|raw| serde_json::from_str(&raw).map_err(QueueError::from))
            .transpose()
    }

    async fn set(&self, record: &JobRecord) -> QueueResult<()> {
        let mut con = self.manager.clone();
        let json = serde_json::to_string(record)?;
        let _: () = redis::pipe()
            .atomic()
            .set(Self::job_key(&record.id), json)
            .ignore()
            .sadd(JOB_INDEX_KEY, record.id.as_str())
            .ignore()
            .query_async(&mut con)
            .await?;
        Ok(())
    }

    async fn compare_and_set(&self, expected: &JobRecord, record: &JobRecord) -> QueueResult<bool> {
        let mut con = self.manager.clone();
        // Same serializer as the stored record, so the strings compare equal
        let started = match serde_json::to_value(expected.started_at)? {
            serde_json::Value::String(started) => started,
            _ => String::new(),
        };
        let written: i32 = Script::new(COMPARE_AND_SET)
            .key(Self::job_key(&record.id))
            .key(JOB_INDEX_KEY)
            .arg(expected.status.name())
            .arg(started)
            .arg(serde_json::to_string(record)?)
            .arg(record.id.as_str())
            .invoke_async(&mut con)
            .await?;
        Ok(written == 1)
    }

    async fn list(&self) -> QueueResult<Vec<JobRecord>> {
        let mut con = self.manager.clone();
        let ids: Vec<String> = con.smembers(JOB_INDEX_KEY).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids
            .iter()
            .map(|id| Self::job_key(&JobId::from(id.as_str())))
            .collect();
        let raws: Vec<Option<String>> = con.mget(keys).await?;

        let mut records = Vec::with_capacity(raws.len());
        for raw in raws.into_iter().flatten() {
            match serde_json::from_str::<JobRecord>(&raw) {
                Ok(record) => records.push(record),
                Err(e) => error!("Skipping undecodable job record: {}", e),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl JobQueue for RedisBackend {
    async fn push(&self, message: &JobMessage) -> QueueResult<()> {
        let mut con = self.manager.clone();
        let json = serde_json::to_string(message)?;
        let _: () = con.lpush(QUEUE_KEY, json).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn pop(&self) -> QueueResult<Option<JobMessage>> {
        let mut con = self.manager.clone();
        let raw: Option<String> = con.rpop(QUEUE_KEY, None).await?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(message) => Ok(Some(message)),
            Err(e) => {
                // RPOP is destructive: the entry is gone, keep it in the logs
                error!(entry = %raw, "Dropping undecodable queue entry: {}", e);
                if let Some(id) = entry_id(&raw) {
                    self.fail_undecodable(&id, &e).await;
                }
                Err(QueueError::from(e))
            }
        }
    }

    async fn len(&self) -> QueueResult<usize> {
        let mut con = self.manager.clone();
        let len: usize = con.llen(QUEUE_KEY).await?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_id_is_read_from_partially_valid_entries() {
        assert_eq!(
            entry_id(r#"{"id":"report-1","task":42}"#),
            Some(JobId::from("report-1"))
        );
        assert_eq!(entry_id(r#"{"task":"generateStrategicReport"}"#), None);
        assert_eq!(entry_id("not json"), None);
    }
}
