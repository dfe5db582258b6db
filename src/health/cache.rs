use crate::domain::health::HealthStatus;
use crate::error::StorageError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

/// Longest TTL or probe window any backend will honour.
pub const MAX_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Shared health view. The monitor writes it, the router reads it.
#[async_trait::async_trait]
pub trait HealthStatusCache: Send + Sync {
    /// Returns `None` once the entry's TTL has elapsed.
    async fn get(&self, processor: &str) -> Result<Option<HealthStatus>, StorageError>;

    async fn set(
        &self,
        processor: &str,
        status: HealthStatus,
        ttl_seconds: u64,
    ) -> Result<(), StorageError>;

    /// Claims the exclusive right to probe `processor` for the next
    /// `window_seconds`. Lets several instances share one probe budget.
    async fn claim_probe_slot(
        &self,
        processor: &str,
        window_seconds: u64,
    ) -> Result<bool, StorageError>;
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    status: HealthStatus,
    expires_at: Instant,
}

#[derive(Default, Clone)]
pub struct InMemoryHealthCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    probe_slots: Arc<RwLock<HashMap<String, Instant>>>,
}

impl InMemoryHealthCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl HealthStatusCache for InMemoryHealthCache {
    async fn get(&self, processor: &str) -> Result<Option<HealthStatus>, StorageError> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        Ok(entries
            .get(processor)
            .filter(|e| now < e.expires_at)
            .map(|e| e.status))
    }

    async fn set(
        &self,
        processor: &str,
        status: HealthStatus,
        ttl_seconds: u64,
    ) -> Result<(), StorageError> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_seconds.min(MAX_TTL_SECONDS));
        let mut entries = self.entries.write().await;
        entries.insert(processor.to_string(), Entry { status, expires_at });
        Ok(())
    }

    async fn claim_probe_slot(
        &self,
        processor: &str,
        window_seconds: u64,
    ) -> Result<bool, StorageError> {
        let now = Instant::now();
        let mut slots = self.probe_slots.write().await;
        if slots.get(processor).is_some_and(|until| now < *until) {
            return Ok(false);
        }
        slots.insert(
            processor.to_string(),
            now + Duration::from_secs(window_seconds.min(MAX_TTL_SECONDS)),
        );
        Ok(true)
    }
}
