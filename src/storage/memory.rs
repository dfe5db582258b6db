use crate::domain::payment::{PaymentsSummary, ProcessorRecord};
use crate::error::StorageError;
use crate::storage::RecordStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Records keyed by correlation id, like the Redis hashes.
#[derive(Default, Clone)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<Uuid, ProcessorRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<ProcessorRecord> {
        let records = self.records.read().await;
        let mut out: Vec<ProcessorRecord> = records.values().cloned().collect();
        out.sort_by_key(|r| r.processed_at);
        out
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn store_payment(&self, record: &ProcessorRecord) -> Result<(), StorageError> {
        let mut records = self.records.write().await;
        records.insert(record.correlation_id, record.clone());
        Ok(())
    }

    async fn payments_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PaymentsSummary, StorageError> {
        let records = self.records.read().await;
        Ok(PaymentsSummary::from_records(records.values(), from, to))
    }
}
