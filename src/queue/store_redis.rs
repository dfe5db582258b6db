use crate::domain::payment::QueueMessage;
use crate::error::QueueError;
use crate::queue::QueueBackend;
use redis::aio::ConnectionManager;
use redis::streams::{StreamId, StreamRangeReply};
use redis::AsyncCommands;

/// Attempts to win a race for the head entry before reporting empty.
const MAX_CLAIM_ATTEMPTS: usize = 8;

/// Queue backed by a Redis stream per queue name. An entry is delivered to
/// whichever consumer's `XDEL` actually removes it.
#[derive(Clone)]
pub struct RedisStreamQueue {
    pub conn: ConnectionManager,
}

impl RedisStreamQueue {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

pub fn message_from_entry(entry: &StreamId) -> Result<QueueMessage, QueueError> {
    entry
        .map
        .iter()
        .map(|(field, value)| {
            redis::from_redis_value::<String>(value)
                .map(|v| (field.clone(), v))
                .map_err(|e| QueueError::Malformed(format!("{} field `{}`: {}", entry.id, field, e)))
        })
        .collect()
}

#[async_trait::async_trait]
impl QueueBackend for RedisStreamQueue {
    async fn enqueue(&self, queue_name: &str, message: QueueMessage) -> Result<(), QueueError> {
        let mut conn = self.conn.clone();
        let items: Vec<(String, String)> = message.into_iter().collect();
        let _: String = conn.xadd(queue_name, "*", items.as_slice()).await?;
        Ok(())
    }

    async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueMessage>, QueueError> {
        let mut conn = self.conn.clone();
        for _ in 0..MAX_CLAIM_ATTEMPTS {
            let reply: StreamRangeReply = conn.xrange_count(queue_name, "-", "+", 1).await?;
            let Some(entry) = reply.ids.into_iter().next() else {
                return Ok(None);
            };

            let removed: i64 = conn.xdel(queue_name, &[entry.id.as_str()]).await?;
            if removed == 1 {
                return message_from_entry(&entry).map(Some);
            }
            tracing::debug!("stream entry {} claimed by another consumer", entry.id);
        }
        tracing::debug!(
            "gave up on {} after losing {} claims; reporting empty",
            queue_name,
            MAX_CLAIM_ATTEMPTS
        );
        Ok(None)
    }
}
