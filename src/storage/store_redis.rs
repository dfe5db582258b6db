use crate::domain::payment::{parse_timestamp, PaymentsSummary, ProcessorName, ProcessorRecord};
use crate::error::StorageError;
use crate::storage::RecordStore;
use chrono::{DateTime, SecondsFormat, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

pub const PROCESSED_AT_INDEX: &str = "payments:processed_at";

/// One hash per payment plus a sorted-set index scored by epoch millis.
#[derive(Clone)]
pub struct RedisRecordStore {
    pub conn: ConnectionManager,
}

impl RedisRecordStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    pub fn record_key(correlation_id: &str) -> String {
        format!("payment:{}", correlation_id)
    }
}

pub fn record_fields(record: &ProcessorRecord) -> [(&'static str, String); 4] {
    [
        ("correlation_id", record.correlation_id.to_string()),
        ("amount", record.amount.to_string()),
        ("processor_used", record.processor.to_string()),
        (
            "processed_at",
            record
                .processed_at
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ),
    ]
}

pub fn record_from_fields(
    key: &str,
    fields: &HashMap<String, String>,
) -> Result<ProcessorRecord, StorageError> {
    let corrupt = |reason: String| StorageError::Corrupt {
        key: key.to_string(),
        reason,
    };
    let field = |name: &str| {
        fields
            .get(name)
            .ok_or_else(|| corrupt(format!("missing `{}`", name)))
    };

    Ok(ProcessorRecord {
        correlation_id: Uuid::parse_str(field("correlation_id")?)
            .map_err(|e| corrupt(e.to_string()))?,
        amount: Decimal::from_str(field("amount")?).map_err(|e| corrupt(e.to_string()))?,
        processor: ProcessorName::from_str(field("processor_used")?).map_err(corrupt)?,
        processed_at: parse_timestamp(field("processed_at")?)
            .map_err(|e| corrupt(e.to_string()))?,
    })
}

#[async_trait::async_trait]
impl RecordStore for RedisRecordStore {
    async fn store_payment(&self, record: &ProcessorRecord) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let id = record.correlation_id.to_string();
        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(Self::record_key(&id), &record_fields(record))
            .ignore()
            .zadd(PROCESSED_AT_INDEX, &id, record.processed_at.timestamp_millis())
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn payments_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PaymentsSummary, StorageError> {
        let mut conn = self.conn.clone();
        // millisecond scores may admit a few edge records; the exact bounds
        // are re-applied below
        let ids: Vec<String> = conn
            .zrangebyscore(
                PROCESSED_AT_INDEX,
                from.timestamp_millis(),
                to.timestamp_millis(),
            )
            .await?;
        if ids.is_empty() {
            return Ok(PaymentsSummary::default());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.hgetall(Self::record_key(id));
        }
        let rows: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await?;

        let mut records = Vec::with_capacity(rows.len());
        for (id, row) in ids.iter().zip(rows) {
            let key = Self::record_key(id);
            match record_from_fields(&key, &row) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("skipping payment record: {}", e),
            }
        }
        Ok(PaymentsSummary::from_records(&records, from, to))
    }
}
