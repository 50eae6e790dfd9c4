//! Two-tier cache behaviour: keys, TTLs, degraded shared tier and invalidation

#[cfg(test)]
mod tests {
    use crate::cache::{
        invalidation::spawn_invalidation_listener, BroadcastBus, CacheAside, CacheKey, CacheStore, CacheTtlInfo,
        InvalidatedKeys, InvalidationBus, MemoryRemoteCache, RemoteCache, TtlPair, DELETE_CACHE_KEYS,
    };
    use crate::tests::support::{memory_store, FailingRemote};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn counted_producer(counter: &AtomicUsize, value: u64) -> impl std::future::Future<Output = Result<u64, String>> + '_ {
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }
    }

    #[test]
    fn test_key_generation_keeps_argument_order() {
        let ab = CacheKey::new("pair").arg("A").arg("B");
        let ba = CacheKey::new("pair").arg("B").arg("A");

        assert_eq!(ab.to_string(), "pair.A.B");
        assert_ne!(ab, ba);
        assert_ne!(ab.to_string(), ba.to_string());
        assert_eq!(ab, CacheKey::with_args("pair", ["A", "B"]));
    }

    #[test]
    fn test_ttl_pair_clamps_local_to_remote() {
        let ttl = TtlPair::from_secs(10, 60);
        assert_eq!(ttl.local(), Duration::from_secs(10));
        assert_eq!(CacheTtlInfo::ESCROW.local(), CacheTtlInfo::ESCROW.remote() / 2);
    }

    #[tokio::test]
    async fn test_get_or_set_runs_producer_once_within_ttl() {
        let store = memory_store();
        let key = CacheKey::new("test").arg("once");
        let calls = AtomicUsize::new(0);
        let ttl = TtlPair::from_secs(60, 30);

        let first = store.get_or_set(&key, ttl, || counted_producer(&calls, 7)).await;
        let second = store.get_or_set(&key, ttl, || counted_producer(&calls, 8)).await;

        assert_eq!(first, Ok(7));
        assert_eq!(second, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_set_runs_producer_again_after_expiry() {
        let store = memory_store();
        let key = CacheKey::new("test").arg("expiry");
        let calls = AtomicUsize::new(0);
        let ttl = TtlPair::new(Duration::from_millis(50), Duration::from_millis(50));

        store.get_or_set(&key, ttl, || counted_producer(&calls, 1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        let value = store.get_or_set(&key, ttl, || counted_producer(&calls, 2)).await.unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_shared_hit_repopulates_private_tier() {
        let remote: Arc<dyn RemoteCache> = Arc::new(MemoryRemoteCache::new(100));
        let writer = CacheStore::new(100, Duration::from_secs(30), remote.clone());
        let reader = CacheStore::new(100, Duration::from_secs(30), remote);
        let key = CacheKey::new("pair").arg("lockedValueUSD").arg("x");

        writer.set(&key, "42".to_string(), CacheTtlInfo::PRICE).await;
        assert!(!reader.is_cached_locally(&key.to_string()));

        let value: Option<String> = reader.get(&key).await;
        assert_eq!(value.as_deref(), Some("42"));
        assert!(reader.is_cached_locally(&key.to_string()));
    }

    #[tokio::test]
    async fn test_zero_local_ttl_skips_private_tier() {
        let store = memory_store();
        let key = CacheKey::new("test").arg("remote-only");

        store
            .set(&key, 5u32, TtlPair::new(Duration::from_secs(60), Duration::ZERO))
            .await;

        assert!(!store.is_cached_locally(&key.to_string()));
        assert_eq!(store.get::<u32>(&key).await, Some(5));
    }

    #[tokio::test]
    async fn test_unreadable_payload_is_a_miss() {
        let store = memory_store();
        let key = CacheKey::new("test").arg("schema");
        store.set(&key, "not a number".to_string(), CacheTtlInfo::PRICE).await;

        assert_eq!(store.get::<u64>(&key).await, None);
    }

    #[tokio::test]
    async fn test_degraded_shared_tier_never_surfaces_errors() {
        let remote = Arc::new(FailingRemote::default());
        let store = CacheStore::new(100, Duration::from_secs(30), remote.clone());
        let key = CacheKey::new("test").arg("degraded");
        let calls = AtomicUsize::new(0);

        let first = store
            .get_or_set(&key, CacheTtlInfo::PRICE, || counted_producer(&calls, 11))
            .await;
        let second = store
            .get_or_set(&key, CacheTtlInfo::PRICE, || counted_producer(&calls, 12))
            .await;

        assert_eq!(first, Ok(11));
        // The private tier still serves the value
        assert_eq!(second, Ok(11));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(remote.calls() > 0);

        store.delete(&key).await;
        assert_eq!(store.get::<u64>(&key).await, None);
    }

    #[tokio::test]
    async fn test_producer_errors_are_not_cached() {
        let aside = CacheAside::new(memory_store(), "test");
        let key = aside.key("failing");
        let calls = AtomicUsize::new(0);

        let failed: Result<u64, String> = aside
            .wrap(key.clone(), CacheTtlInfo::PRICE, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("ledger unavailable".to_string())
            })
            .await;
        assert_eq!(failed, Err("ledger unavailable".to_string()));
        assert_eq!(aside.store().get::<u64>(&key).await, None);

        let recovered = aside
            .wrap(key, CacheTtlInfo::PRICE, || counted_producer(&calls, 3))
            .await;
        assert_eq!(recovered, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidation_evicts_private_entries_on_every_instance() {
        let remote: Arc<dyn RemoteCache> = Arc::new(MemoryRemoteCache::new(100));
        let bus = BroadcastBus::default();
        let shutdown = CancellationToken::new();

        let local = Arc::new(CacheStore::new(100, Duration::from_secs(30), remote.clone()));
        let peer = Arc::new(CacheStore::new(100, Duration::from_secs(30), remote));
        let listeners = vec![
            spawn_invalidation_listener(local.clone(), &bus, shutdown.clone()),
            spawn_invalidation_listener(peer.clone(), &bus, shutdown.clone()),
        ];

        let key = CacheKey::new("pair").arg("firstTokenPrice").arg("p");
        local.set(&key, 1u64, CacheTtlInfo::PRICE).await;
        assert_eq!(peer.get::<u64>(&key).await, Some(1));
        assert!(peer.is_cached_locally(&key.to_string()));

        // A new value lands on the shared tier; the peer's private copy is stale
        let mut keys = InvalidatedKeys::new();
        keys.push(local.write_through(key.clone(), &2u64, CacheTtlInfo::PRICE).await);
        assert_eq!(keys.flush(&bus).await.unwrap(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!peer.is_cached_locally(&key.to_string()));
        assert_eq!(peer.get::<u64>(&key).await, Some(2));

        shutdown.cancel();
        for listener in listeners {
            listener.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_empty_invalidation_batch_is_not_published() {
        let bus = BroadcastBus::default();
        let mut receiver = bus.subscribe(DELETE_CACHE_KEYS);

        assert_eq!(InvalidatedKeys::new().flush(&bus).await.unwrap(), 0);
        assert!(receiver.try_recv().is_err());
    }
}
