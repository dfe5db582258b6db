use crate::domain::payment::{PaymentRequest, ProcessorName};
use crate::error::ProcessorError;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

pub mod http;
pub mod mock;

/// Body sent to a processor's `/payments` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessorPayload {
    #[serde(rename = "correlationId")]
    pub correlation_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "requestedAt")]
    pub requested_at: String,
}

impl ProcessorPayload {
    pub fn new(request: &PaymentRequest, processed_at: DateTime<Utc>) -> Self {
        Self {
            correlation_id: request.correlation_id.to_string(),
            amount: request.amount,
            requested_at: processed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessorResponse {
    pub processor: ProcessorName,
    pub message: Option<String>,
}

#[async_trait::async_trait]
pub trait ProcessorCall: Send + Sync {
    fn name(&self) -> ProcessorName;

    async fn process_payment(
        &self,
        request: &PaymentRequest,
        processed_at: DateTime<Utc>,
    ) -> Result<ProcessorResponse, ProcessorError>;
}
