use crate::domain::health::HealthStatus;
use crate::domain::payment::{
    CreatePaymentRequest, PaymentRequest, PaymentsSummary, ProcessorName, ProcessorRecord,
};
use crate::error::{AcceptError, RoutingError, StorageError};
use crate::health::cache::HealthStatusCache;
use crate::processors::ProcessorCall;
use crate::queue::QueueManager;
use crate::routing::policy::{CandidateHealth, RoutingPolicy};
use crate::storage::writer::RecordWriter;
use crate::storage::RecordStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedPayment {
    pub processor: ProcessorName,
    pub processed_at: DateTime<Utc>,
    pub attempts: usize,
}

#[derive(Clone)]
pub struct PaymentService {
    pub default: Arc<dyn ProcessorCall>,
    pub fallback: Arc<dyn ProcessorCall>,
    pub health_cache: Arc<dyn HealthStatusCache>,
    pub policy: Arc<dyn RoutingPolicy>,
    pub queue: QueueManager,
    pub records: RecordWriter,
    pub record_store: Arc<dyn RecordStore>,
}

impl PaymentService {
    /// Validates and enqueues; processing happens later on a worker.
    pub async fn accept_payment(
        &self,
        req: CreatePaymentRequest,
    ) -> Result<PaymentRequest, AcceptError> {
        let request = PaymentRequest::try_from(req)?;
        self.queue.add_payment(&request).await?;
        Ok(request)
    }

    pub async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<ProcessedPayment, RoutingError> {
        let processed_at = Utc::now();
        let health = self.health_snapshot().await;
        let candidates = self.policy.rank(&health);

        if candidates.is_empty() {
            tracing::warn!(
                "no viable processor for payment {} (policy={})",
                request.correlation_id,
                self.policy.name()
            );
            return Err(RoutingError::ProvidersUnavailable);
        }

        let mut last_error = None;
        for (attempt, candidate) in candidates.iter().enumerate() {
            let processor = self.processor(*candidate);
            let name = processor.name();
            match processor.process_payment(request, processed_at).await {
                Ok(_) => {
                    self.record(ProcessorRecord {
                        correlation_id: request.correlation_id,
                        amount: request.amount,
                        processor: name,
                        processed_at,
                    })
                    .await;
                    tracing::debug!("payment {} processed by {}", request.correlation_id, name);
                    return Ok(ProcessedPayment {
                        processor: name,
                        processed_at,
                        attempts: attempt + 1,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "payment {} failed on {}, trying next candidate: {}",
                        request.correlation_id,
                        name,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) => {
                tracing::error!("payment {} failed on every processor", request.correlation_id);
                Err(RoutingError::AllProcessorsFailed { last })
            }
            None => Err(RoutingError::ProvidersUnavailable),
        }
    }

    pub async fn payments_summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PaymentsSummary, StorageError> {
        if let Err(e) = self.records.flush().await {
            tracing::warn!("summary read without flushing pending records: {}", e);
        }
        self.record_store.payments_summary(from, to).await
    }

    /// Cached health of both processors; anything unknown counts as failing.
    pub async fn health_snapshot(&self) -> Vec<CandidateHealth> {
        let mut snapshot = Vec::with_capacity(ProcessorName::ALL.len());
        for processor in ProcessorName::ALL {
            let cached = match self.health_cache.get(processor.as_str()).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!("health cache read for {} failed: {}", processor, e);
                    None
                }
            };
            snapshot.push(CandidateHealth {
                processor,
                status: HealthStatus::or_failing(cached),
            });
        }
        snapshot
    }

    fn processor(&self, name: ProcessorName) -> &dyn ProcessorCall {
        match name {
            ProcessorName::Default => self.default.as_ref(),
            ProcessorName::Fallback => self.fallback.as_ref(),
        }
    }

    async fn record(&self, record: ProcessorRecord) {
        let id = record.correlation_id;
        if let Err(e) = self.records.submit(record).await {
            tracing::error!("payment {} processed but not recorded: {}", id, e);
        }
    }
}
