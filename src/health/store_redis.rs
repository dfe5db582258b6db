use crate::domain::health::HealthStatus;
use crate::error::StorageError;
use crate::health::cache::{HealthStatusCache, MAX_TTL_SECONDS};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

#[derive(Clone)]
pub struct RedisHealthCache {
    pub conn: ConnectionManager,
}

impl RedisHealthCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub fn status_key(processor: &str) -> String {
        format!("health:{}", processor.to_lowercase())
    }

    pub fn probe_slot_key(processor: &str) -> String {
        format!("health:probe_slot:{}", processor.to_lowercase())
    }
}

#[async_trait::async_trait]
impl HealthStatusCache for RedisHealthCache {
    async fn get(&self, processor: &str) -> Result<Option<HealthStatus>, StorageError> {
        let mut conn = self.conn.clone();
        let key = Self::status_key(processor);
        let payload: Option<String> = conn.get(&key).await?;
        match payload {
            Some(p) => serde_json::from_str::<HealthStatus>(&p)
                .map(Some)
                .map_err(|e| StorageError::Corrupt {
                    key,
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        processor: &str,
        status: HealthStatus,
        ttl_seconds: u64,
    ) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let key = Self::status_key(processor);
        let payload = serde_json::to_string(&status).map_err(|e| StorageError::Corrupt {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        // SET EX rejects a zero expiry
        let _: () = conn.set_ex(key, payload, ttl_seconds.clamp(1, MAX_TTL_SECONDS)).await?;
        Ok(())
    }

    async fn claim_probe_slot(
        &self,
        processor: &str,
        window_seconds: u64,
    ) -> Result<bool, StorageError> {
        let mut conn = self.conn.clone();
        let claimed: Option<String> = redis::cmd("SET")
            .arg(Self::probe_slot_key(processor))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(window_seconds.clamp(1, MAX_TTL_SECONDS))
            .query_async(&mut conn)
            .await?;
        Ok(claimed.is_some())
    }
}
