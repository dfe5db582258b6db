use crate::domain::payment::{PaymentsSummary, ProcessorRecord};
use crate::error::StorageError;
use chrono::{DateTime, Utc};

pub mod memory;
pub mod store_redis;
pub mod writer;

/// Append-only store of processed payments.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    async fn store_payment(&self, record: &ProcessorRecord) -> Result<(), StorageError>;

    /// Per-processor count and exact decimal sum over `[from, to]`.
    async fn payments_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PaymentsSummary, StorageError>;
}
