//! Redis backend for the shared tier and the invalidation bus, so several
//! service processes share entries and evictions

use super::invalidation::{BroadcastBus, InvalidationBus};
use super::remote::{RemoteCache, RemoteEntry};
use super::CacheError;
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

fn backend(e: redis::RedisError) -> CacheError {
    CacheError::Backend(e.to_string())
}

/// Time left on a key from its `PTTL` reply. Missing keys (-2) and keys
/// without an expiry (-1) count as absent.
pub fn remaining_ttl(pttl_millis: i64) -> Option<Duration> {
    u64::try_from(pttl_millis)
        .ok()
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis)
}

/// Payload of one invalidation message: a JSON array of keys
pub fn decode_invalidation(payload: &str) -> Result<Vec<String>, CacheError> {
    Ok(serde_json::from_str(payload)?)
}

#[derive(Clone)]
pub struct RedisRemoteCache {
    connection: MultiplexedConnection,
}

impl RedisRemoteCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(backend)?;
        let connection = client.get_multiplexed_async_connection().await.map_err(backend)?;
        info!("Connected shared cache to redis");
        Ok(Self { connection })
    }
}

#[async_trait]
impl RemoteCache for RedisRemoteCache {
    async fn get(&self, key: &str) -> Result<Option<RemoteEntry>, CacheError> {
        let mut connection = self.connection.clone();
        let (payload, pttl): (Option<String>, i64) = redis::pipe()
            .cmd("GET")
            .arg(key)
            .cmd("PTTL")
            .arg(key)
            .query_async(&mut connection)
            .await
            .map_err(backend)?;

        Ok(payload.zip(remaining_ttl(pttl)).map(|(payload, remaining_ttl)| RemoteEntry {
            payload,
            remaining_ttl,
        }))
    }

    async fn set(&self, key: &str, payload: String, ttl: Duration) -> Result<(), CacheError> {
        // PX 0 is rejected by redis
        let millis = ttl.as_millis().max(1) as u64;
        let mut connection = self.connection.clone();
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("PX")
            .arg(millis)
            .query_async(&mut connection)
            .await
            .map_err(backend)?;
        debug!("Stored shared entry {} with TTL: {:?}", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: () = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut connection)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

/// Publishes to a redis channel per topic. Subscribers get a local broadcast
/// receiver fed by one forwarding task per topic.
pub struct RedisBus {
    client: Client,
    connection: MultiplexedConnection,
    local: Arc<BroadcastBus>,
    forwarded: Mutex<HashSet<String>>,
}

impl RedisBus {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(backend)?;
        let connection = client.get_multiplexed_async_connection().await.map_err(backend)?;
        info!("Connected invalidation bus to redis");
        Ok(Self {
            client,
            connection,
            local: Arc::new(BroadcastBus::default()),
            forwarded: Mutex::new(HashSet::new()),
        })
    }

    fn forward(&self, topic: &str) {
        if !self.forwarded.lock().insert(topic.to_string()) {
            return;
        }

        let client = self.client.clone();
        let local = self.local.clone();
        let topic = topic.to_string();
        tokio::spawn(async move {
            let mut pubsub = match client.get_async_pubsub().await {
                Ok(pubsub) => pubsub,
                Err(e) => {
                    error!("Failed to open redis subscription for {}: {}", topic, e);
                    return;
                }
            };
            if let Err(e) = pubsub.subscribe(&topic).await {
                error!("Failed to subscribe to redis channel {}: {}", topic, e);
                return;
            }
            info!("Forwarding redis channel {}", topic);

            let mut messages = Box::pin(pubsub.into_on_message());
            while let Some(message) = messages.next().await {
                let keys = message
                    .get_payload::<String>()
                    .map_err(backend)
                    .and_then(|payload| decode_invalidation(&payload));
                match keys {
                    Ok(keys) => {
                        let _ = local.publish(&topic, keys).await;
                    }
                    Err(e) => warn!("Dropping malformed message on {}: {}", topic, e),
                }
            }
            info!("Redis channel {} closed", topic);
        });
    }
}

#[async_trait]
impl InvalidationBus for RedisBus {
    async fn publish(&self, topic: &str, keys: Vec<String>) -> Result<(), CacheError> {
        let payload = serde_json::to_string(&keys)?;
        let mut connection = self.connection.clone();
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(topic)
            .arg(payload)
            .query_async(&mut connection)
            .await
            .map_err(backend)?;
        debug!("Published {} keys on {} to {} instances", keys.len(), topic, receivers);
        Ok(())
    }

    fn subscribe(&self, topic: &str) -> broadcast::Receiver<Vec<String>> {
        let receiver = self.local.subscribe(topic);
        self.forward(topic);
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pttl_reply_maps_to_remaining_ttl() {
        assert_eq!(remaining_ttl(1500), Some(Duration::from_millis(1500)));
        assert_eq!(remaining_ttl(0), None);
        assert_eq!(remaining_ttl(-1), None);
        assert_eq!(remaining_ttl(-2), None);
    }

    #[test]
    fn test_invalidation_payload_is_a_key_list() {
        let keys = decode_invalidation(r#"["pair.reserves.erd1","router.pairs"]"#).unwrap();
        assert_eq!(keys, vec!["pair.reserves.erd1".to_string(), "router.pairs".to_string()]);

        assert!(matches!(
            decode_invalidation("not json"),
            Err(CacheError::Serialization(_))
        ));
    }
}
