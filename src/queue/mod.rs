use crate::domain::payment::{PaymentProcessRequest, PaymentRequest, QueueMessage};
use crate::error::QueueError;
use chrono::Utc;
use std::sync::Arc;

pub mod memory;
pub mod store_redis;

pub const PAYMENTS_QUEUE: &str = "payments:queue";

/// Ordered, append-only log of messages per queue name.
#[async_trait::async_trait]
pub trait QueueBackend: Send + Sync {
    async fn enqueue(&self, queue_name: &str, message: QueueMessage) -> Result<(), QueueError>;

    /// Removes and returns the oldest message, `None` when empty. A message
    /// is handed to exactly one caller and is gone once returned. Shared
    /// backends may also return `None` when other consumers keep winning
    /// the head entry; callers simply poll again.
    async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueMessage>, QueueError>;
}

#[derive(Clone)]
pub struct QueueManager {
    backend: Arc<dyn QueueBackend>,
    queue_name: String,
}

impl QueueManager {
    pub fn new(backend: Arc<dyn QueueBackend>, queue_name: impl Into<String>) -> Self {
        Self {
            backend,
            queue_name: queue_name.into(),
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Stamps the payment with the enqueue time and appends it.
    pub async fn add_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentProcessRequest, QueueError> {
        let message = PaymentProcessRequest::new(request, Utc::now());
        self.backend
            .enqueue(&self.queue_name, message.to_message())
            .await?;
        tracing::debug!("queued payment {}", message.correlation_id);
        Ok(message)
    }

    pub async fn next_payment(&self) -> Result<Option<PaymentProcessRequest>, QueueError> {
        match self.backend.dequeue(&self.queue_name).await? {
            Some(fields) => PaymentProcessRequest::from_message(&fields).map(Some),
            None => Ok(None),
        }
    }
}
