use crate::queue::QueueManager;
use crate::service::payment_service::PaymentService;
use crate::service::task::TaskSlot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One dequeue-and-route step.
pub struct PaymentWorker {
    pub queue: QueueManager,
    pub payment_service: PaymentService,
}

impl PaymentWorker {
    pub fn new(queue: QueueManager, payment_service: PaymentService) -> Self {
        Self {
            queue,
            payment_service,
        }
    }

    /// Returns `Ok(false)` when the queue was empty. The message is consumed
    /// even if routing fails.
    pub async fn process_next_payment(&self) -> anyhow::Result<bool> {
        let Some(message) = self.queue.next_payment().await? else {
            return Ok(false);
        };
        let request = message.to_request()?;
        let processed = self.payment_service.process_payment(&request).await?;
        tracing::debug!(
            "payment {} done via {} after {} attempt(s)",
            request.correlation_id,
            processed.processor,
            processed.attempts
        );
        Ok(true)
    }
}

pub struct BackgroundWorker {
    worker: Arc<PaymentWorker>,
    poll_interval: Duration,
    processed: Arc<AtomicU64>,
    task: TaskSlot,
}

impl BackgroundWorker {
    pub fn new(worker: Arc<PaymentWorker>, poll_interval: Duration) -> Self {
        Self {
            worker,
            poll_interval,
            processed: Arc::new(AtomicU64::new(0)),
            task: TaskSlot::new("payment worker"),
        }
    }

    pub fn start(&self) -> bool {
        let worker = self.worker.clone();
        let processed = self.processed.clone();
        let poll_interval = self.poll_interval;

        self.task.start(move |token| async move {
            while !token.is_cancelled() {
                match worker.process_next_payment().await {
                    Ok(true) => {
                        processed.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(false) => {}
                    Err(e) => tracing::error!("payment worker error: {:#}", e),
                }

                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
        })
    }

    /// Lets the in-flight payment finish, then stops the loop.
    pub async fn stop(&self) {
        self.task.stop().await;
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Payments routed successfully since construction.
    pub fn processed_count(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }
}
