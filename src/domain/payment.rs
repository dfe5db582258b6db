use crate::error::{QueueError, ValidationError};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Flat text map placed on the queue.
pub type QueueMessage = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorName {
    Default,
    Fallback,
}

impl ProcessorName {
    pub const ALL: [ProcessorName; 2] = [ProcessorName::Default, ProcessorName::Fallback];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ProcessorName::Default => "default",
            ProcessorName::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ProcessorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessorName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(ProcessorName::Default),
            "fallback" => Ok(ProcessorName::Fallback),
            other => Err(format!("unknown processor `{}`", other)),
        }
    }
}

/// Body of `POST /payments` before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(rename = "correlationId")]
    pub correlation_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub correlation_id: Uuid,
    pub amount: Decimal,
}

impl PaymentRequest {
    pub fn new(correlation_id: Uuid, amount: Decimal) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }
        Ok(Self {
            correlation_id,
            amount,
        })
    }
}

impl TryFrom<CreatePaymentRequest> for PaymentRequest {
    type Error = ValidationError;

    fn try_from(req: CreatePaymentRequest) -> Result<Self, Self::Error> {
        let correlation_id = Uuid::parse_str(req.correlation_id.trim())
            .map_err(|_| ValidationError::InvalidCorrelationId(req.correlation_id.clone()))?;
        PaymentRequest::new(correlation_id, req.amount)
    }
}

/// A payment as it travels through the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentProcessRequest {
    pub correlation_id: Uuid,
    pub amount: Decimal,
    pub requested_at: DateTime<Utc>,
}

impl PaymentProcessRequest {
    const CORRELATION_ID: &'static str = "correlationId";
    const AMOUNT: &'static str = "amount";
    const REQUESTED_AT: &'static str = "requestedAt";

    pub fn new(request: &PaymentRequest, requested_at: DateTime<Utc>) -> Self {
        Self {
            correlation_id: request.correlation_id,
            amount: request.amount,
            requested_at,
        }
    }

    pub fn to_message(&self) -> QueueMessage {
        let mut fields = QueueMessage::with_capacity(3);
        fields.insert(Self::CORRELATION_ID.to_string(), self.correlation_id.to_string());
        fields.insert(Self::AMOUNT.to_string(), self.amount.to_string());
        fields.insert(Self::REQUESTED_AT.to_string(), self.requested_at.to_rfc3339());
        fields
    }

    pub fn from_message(fields: &QueueMessage) -> Result<Self, QueueError> {
        let field = |name: &str| {
            fields
                .get(name)
                .ok_or_else(|| QueueError::Malformed(format!("missing field `{}`", name)))
        };

        let correlation_id = Uuid::parse_str(field(Self::CORRELATION_ID)?)
            .map_err(|e| QueueError::Malformed(format!("correlationId: {}", e)))?;
        let amount = Decimal::from_str(field(Self::AMOUNT)?)
            .map_err(|e| QueueError::Malformed(format!("amount: {}", e)))?;
        let requested_at = parse_timestamp(field(Self::REQUESTED_AT)?)
            .map_err(|e| QueueError::Malformed(format!("requestedAt: {}", e)))?;

        Ok(Self {
            correlation_id,
            amount,
            requested_at,
        })
    }

    pub fn to_request(&self) -> Result<PaymentRequest, ValidationError> {
        PaymentRequest::new(self.correlation_id, self.amount)
    }
}

/// Outcome of one successfully processed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorRecord {
    pub correlation_id: Uuid,
    pub amount: Decimal,
    pub processor: ProcessorName,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessorSummary {
    #[serde(rename = "totalRequests")]
    pub total_requests: u64,
    #[serde(rename = "totalAmount", with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

impl ProcessorSummary {
    pub fn add(&mut self, amount: Decimal) {
        self.total_requests += 1;
        self.total_amount += amount;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaymentsSummary {
    pub default: ProcessorSummary,
    pub fallback: ProcessorSummary,
}

impl PaymentsSummary {
    pub fn entry(&mut self, processor: ProcessorName) -> &mut ProcessorSummary {
        match processor {
            ProcessorName::Default => &mut self.default,
            ProcessorName::Fallback => &mut self.fallback,
        }
    }

    /// Folds records whose `processed_at` lies in `[from, to]`.
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a ProcessorRecord>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Self {
        let mut summary = Self::default();
        for record in records {
            if record.processed_at >= from && record.processed_at <= to {
                summary.entry(record.processor).add(record.amount);
            }
        }
        summary
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentAccepted {
    #[serde(rename = "correlationId")]
    pub correlation_id: Uuid,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

/// RFC 3339, or a naive ISO-8601 timestamp read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(ValidationError::InvalidTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rejects_zero_and_negative_amounts() {
        let id = Uuid::new_v4();
        assert_eq!(
            PaymentRequest::new(id, Decimal::ZERO),
            Err(ValidationError::NonPositiveAmount)
        );
        assert_eq!(
            PaymentRequest::new(id, dec("-0.01")),
            Err(ValidationError::NonPositiveAmount)
        );
        assert!(PaymentRequest::new(id, dec("0.01")).is_ok());
    }

    #[test]
    fn rejects_non_uuid_correlation_id() {
        let raw = CreatePaymentRequest {
            correlation_id: "not-a-uuid".to_string(),
            amount: dec("10"),
        };
        assert!(matches!(
            PaymentRequest::try_from(raw),
            Err(ValidationError::InvalidCorrelationId(_))
        ));
    }

    #[test]
    fn queue_message_keeps_text_values() {
        let req = PaymentRequest::new(Uuid::new_v4(), dec("19.90")).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        let msg = PaymentProcessRequest::new(&req, at).to_message();

        assert_eq!(msg["amount"], "19.90");
        assert_eq!(msg["correlationId"], req.correlation_id.to_string());

        let back = PaymentProcessRequest::from_message(&msg).unwrap();
        assert_eq!(back.amount, dec("19.90"));
        assert_eq!(back.requested_at, at);
    }

    #[test]
    fn malformed_message_is_reported() {
        let mut msg = QueueMessage::new();
        msg.insert("correlationId".to_string(), Uuid::new_v4().to_string());
        msg.insert("amount".to_string(), "abc".to_string());
        msg.insert("requestedAt".to_string(), "2025-07-01T12:00:00Z".to_string());
        assert!(matches!(
            PaymentProcessRequest::from_message(&msg),
            Err(QueueError::Malformed(_))
        ));

        msg.remove("amount");
        assert!(PaymentProcessRequest::from_message(&msg).is_err());
    }

    #[test]
    fn naive_timestamps_are_utc() {
        let naive = parse_timestamp("2025-07-01T12:00:00").unwrap();
        let offset = parse_timestamp("2025-07-01T15:00:00+03:00").unwrap();
        assert_eq!(naive, offset);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn summary_bounds_are_inclusive() {
        let t = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        let record = |amount: &str, processor| ProcessorRecord {
            correlation_id: Uuid::new_v4(),
            amount: dec(amount),
            processor,
            processed_at: t,
        };
        let records = vec![
            record("0.1", ProcessorName::Default),
            record("0.2", ProcessorName::Default),
            record("5", ProcessorName::Fallback),
        ];

        let summary = PaymentsSummary::from_records(&records, t, t);
        assert_eq!(summary.default.total_requests, 2);
        assert_eq!(summary.default.total_amount, dec("0.3"));
        assert_eq!(summary.fallback.total_amount, dec("5"));

        let later = t + chrono::Duration::milliseconds(1);
        let empty = PaymentsSummary::from_records(&records, later, later);
        assert_eq!(empty, PaymentsSummary::default());
    }

    #[test]
    fn summary_serializes_amount_as_number() {
        let mut summary = PaymentsSummary::default();
        summary.default.add(dec("100.50"));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["default"]["totalRequests"], 1);
        assert_eq!(json["default"]["totalAmount"], 100.5);
        assert_eq!(json["fallback"]["totalAmount"], 0.0);
    }
}
