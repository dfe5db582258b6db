use crate::domain::payment::QueueMessage;
use crate::error::QueueError;
use crate::queue::QueueBackend;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-local FIFO queues. Not durable.
#[derive(Default, Clone)]
pub struct InMemoryQueue {
    queues: Arc<Mutex<HashMap<String, VecDeque<QueueMessage>>>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, queue_name: &str) -> usize {
        let queues = self.queues.lock().await;
        queues.get(queue_name).map_or(0, VecDeque::len)
    }
}

#[async_trait::async_trait]
impl QueueBackend for InMemoryQueue {
    async fn enqueue(&self, queue_name: &str, message: QueueMessage) -> Result<(), QueueError> {
        let mut queues = self.queues.lock().await;
        queues
            .entry(queue_name.to_string())
            .or_default()
            .push_back(message);
        Ok(())
    }

    async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueMessage>, QueueError> {
        let mut queues = self.queues.lock().await;
        Ok(queues.get_mut(queue_name).and_then(VecDeque::pop_front))
    }
}
