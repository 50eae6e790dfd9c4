//! Cross-instance invalidation of the private cache tier

use super::store::CacheStore;
use super::CacheError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Topic carrying lists of changed cache keys
pub const DELETE_CACHE_KEYS: &str = "deleteCacheKeys";

#[async_trait]
pub trait InvalidationBus: Send + Sync {
    async fn publish(&self, topic: &str, keys: Vec<String>) -> Result<(), CacheError>;

    fn subscribe(&self, topic: &str) -> broadcast::Receiver<Vec<String>>;
}

/// In-process bus: one broadcast channel per topic
pub struct BroadcastBus {
    capacity: usize,
    channels: Mutex<HashMap<String, broadcast::Sender<Vec<String>>>>,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<Vec<String>> {
        self.channels
            .lock()
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl InvalidationBus for BroadcastBus {
    async fn publish(&self, topic: &str, keys: Vec<String>) -> Result<(), CacheError> {
        let count = keys.len();
        match self.sender(topic).send(keys) {
            Ok(receivers) => debug!("Published {} keys on {} to {} subscribers", count, topic, receivers),
            Err(_) => debug!("Published {} keys on {} with no subscribers", count, topic),
        }
        Ok(())
    }

    fn subscribe(&self, topic: &str) -> broadcast::Receiver<Vec<String>> {
        self.sender(topic).subscribe()
    }
}

/// Subscribe to key invalidations and evict them from this instance's private
/// tier until shutdown. The subscription exists once this function returns.
///
/// A publisher also receives its own message; evicting entries it just wrote
/// only costs one shared-tier read.
pub fn spawn_invalidation_listener(
    store: Arc<CacheStore>,
    bus: &dyn InvalidationBus,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let mut receiver = bus.subscribe(DELETE_CACHE_KEYS);

    tokio::spawn(async move {
        info!("Cache invalidation listener started");
        loop {
            tokio::select! {
                message = receiver.recv() => match message {
                    Ok(keys) => store.delete_local(&keys).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Invalidation listener lagged by {} messages", skipped);
                        store.clear_local();
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Invalidation channel closed");
                        break;
                    }
                },
                _ = shutdown.cancelled() => {
                    info!("Shutting down cache invalidation listener");
                    break;
                }
            }
        }
    })
}

/// Keys written during one pass, published together at the end of it
#[derive(Debug, Default)]
pub struct InvalidatedKeys {
    keys: Vec<String>,
}

impl InvalidatedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: String) {
        self.keys.push(key);
    }

    pub fn extend(&mut self, keys: impl IntoIterator<Item = String>) {
        self.keys.extend(keys);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Publish all collected keys as one message; nothing is sent when empty
    pub async fn flush(self, bus: &dyn InvalidationBus) -> Result<usize, CacheError> {
        if self.keys.is_empty() {
            return Ok(0);
        }
        let count = self.keys.len();
        bus.publish(DELETE_CACHE_KEYS, self.keys).await?;
        Ok(count)
    }
}
