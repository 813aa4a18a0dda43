//! Short-TTL KV store used for at-most-once dedup and as the side-channel DLQ
//! (component D, §4.D). Grounded on
//! `original_source/src/workers/former/former_worker.py` (`redis.setex`,
//! `redis.rpush`) and `message_processor.py` (`redis.EXISTS`).

use redis::AsyncCommands;
use uuid::Uuid;

use crate::error::WorkerError;

#[derive(Clone)]
pub struct DedupStore {
    client: redis::Client,
}

fn dedup_key(subscriber: Uuid, notification_id: Uuid) -> String {
    format!("{subscriber}:{notification_id}")
}

impl DedupStore {
    pub fn new(redis_url: &str) -> Result<Self, WorkerError> {
        let client = redis::Client::open(redis_url)?;
        Ok(DedupStore { client })
    }

    async fn conn(&self) -> Result<redis::aio::MultiplexedConnection, WorkerError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Idempotent write of `"{subscriber}:{notification_id}"` with a TTL.
    pub async fn mark_sent(
        &self,
        subscriber: Uuid,
        notification_id: Uuid,
        ttl_seconds: u64,
    ) -> Result<(), WorkerError> {
        let mut conn = self.conn().await?;
        let key = dedup_key(subscriber, notification_id);
        conn.set_ex::<_, _, ()>(key, 1, ttl_seconds).await?;
        Ok(())
    }

    /// Key-presence check. Only ever called when the `WorkUnit` carries a
    /// `notification_id` — immediate messages are never deduplicated (§4.D).
    pub async fn was_sent(
        &self,
        subscriber: Uuid,
        notification_id: Uuid,
    ) -> Result<bool, WorkerError> {
        let mut conn = self.conn().await?;
        let key = dedup_key(subscriber, notification_id);
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    /// Push a failed unit's original raw payload onto the DLQ list named
    /// after its queue. FIFO by push order.
    pub async fn dlq_push(&self, queue_name: &str, payload: &[u8]) -> Result<(), WorkerError> {
        let mut conn = self.conn().await?;
        conn.rpush::<_, _, ()>(queue_name, payload).await?;
        Ok(())
    }

    /// Pop the oldest payload off a DLQ list; `None` on empty.
    pub async fn dlq_pop(&self, queue_name: &str) -> Result<Option<Vec<u8>>, WorkerError> {
        let mut conn = self.conn().await?;
        let payload: Option<Vec<u8>> = conn.lpop(queue_name, None).await?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_format() {
        let s = Uuid::nil();
        let n = Uuid::nil();
        assert_eq!(dedup_key(s, n), format!("{}:{}", Uuid::nil(), Uuid::nil()));
    }
}
