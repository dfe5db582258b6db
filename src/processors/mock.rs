use crate::domain::payment::{PaymentRequest, ProcessorName};
use crate::error::ProcessorError;
use crate::processors::{ProcessorCall, ProcessorResponse};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    AlwaysSuccess,
    AlwaysFailure,
    AlwaysTimeout,
}

/// In-process processor with a switchable outcome, for tests and local runs.
pub struct MockProcessor {
    pub name: ProcessorName,
    behavior: Mutex<MockBehavior>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Uuid>>,
}

impl MockProcessor {
    pub fn new(name: ProcessorName, behavior: MockBehavior) -> Self {
        Self {
            name,
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        if let Ok(mut current) = self.behavior.lock() {
            *current = behavior;
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Correlation ids of every call, in call order.
    pub fn seen(&self) -> Vec<Uuid> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn behavior(&self) -> MockBehavior {
        self.behavior
            .lock()
            .map(|b| *b)
            .unwrap_or(MockBehavior::AlwaysFailure)
    }
}

#[async_trait::async_trait]
impl ProcessorCall for MockProcessor {
    fn name(&self) -> ProcessorName {
        self.name
    }

    async fn process_payment(
        &self,
        request: &PaymentRequest,
        _processed_at: DateTime<Utc>,
    ) -> Result<ProcessorResponse, ProcessorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.correlation_id);
        }

        match self.behavior() {
            MockBehavior::AlwaysSuccess => Ok(ProcessorResponse {
                processor: self.name,
                message: Some("payment processed successfully".to_string()),
            }),
            MockBehavior::AlwaysFailure => Err(ProcessorError::Http {
                processor: self.name.to_string(),
                status: 500,
                body: "mock failure".to_string(),
            }),
            MockBehavior::AlwaysTimeout => Err(ProcessorError::Timeout {
                processor: self.name.to_string(),
            }),
        }
    }
}
