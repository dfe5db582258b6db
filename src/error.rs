use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("correlationId must be a UUID, got `{0}`")]
    InvalidCorrelationId(String),
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("invalid timestamp `{0}`")]
    InvalidTimestamp(String),
}

/// Failure of a single call to a payment processor.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("processor {processor} timed out")]
    Timeout { processor: String },
    #[error("processor {processor} returned HTTP {status}: {body}")]
    Http {
        processor: String,
        status: u16,
        body: String,
    },
    #[error("processor {processor} transport error: {message}")]
    Transport { processor: String, message: String },
}

impl ProcessorError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProcessorError::Timeout { .. })
    }
}

/// The only errors that escape the routing engine.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("no payment processor is currently available")]
    ProvidersUnavailable,
    #[error("all payment processors failed: {last}")]
    AllProcessorsFailed {
        #[source]
        last: ProcessorError,
    },
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue backend error: {0}")]
    Backend(#[from] redis::RedisError),
    #[error("malformed queue message: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(#[from] redis::RedisError),
    #[error("corrupt payment record `{key}`: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("record writer is closed")]
    WriterClosed,
}

#[derive(Debug, Error)]
pub enum AcceptError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}
