use crate::core::cache::{CacheError, CacheStore, Ttl};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::debug;

struct CacheValue {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

/// In-memory store backed by a `HashMap`.
///
/// [`Ttl::StoreDefault`] entries never expire.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, CacheValue>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut cache = self.inner.lock().await;
        let expired = match cache.get(key) {
            Some(entry) => entry
                .expires_at
                .is_some_and(|expiry| expiry <= Instant::now()),
            None => {
                debug!("Cache MISS for key: {:?}", key);
                return Ok(None);
            }
        };

        if expired {
            debug!("Cache entry expired for key: {:?}", key);
            cache.remove(key);
            return Ok(None);
        }

        debug!("Cache HIT for key: {:?}", key);
        Ok(cache.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Ttl) -> Result<(), CacheError> {
        // A TTL past the clock's range never expires.
        let expires_at = ttl
            .as_duration()
            .and_then(|duration| Instant::now().checked_add(duration));
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {:?}", key);
        cache.insert(key.to_string(), CacheValue { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut cache = self.inner.lock().await;
        cache.remove(key);
        debug!("Cache REMOVE for key: {:?}", key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_store_get_set() {
        let store = MemoryStore::new();

        assert!(store.get("key1").await.unwrap().is_none());

        store
            .set("key1", b"123".to_vec(), Ttl::StoreDefault)
            .await
            .unwrap();

        assert_eq!(store.get("key1").await.unwrap(), Some(b"123".to_vec()));
        assert!(store.get("key2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_ttl_expiration() {
        let store = MemoryStore::new();

        store
            .set("key1", b"123".to_vec(), Ttl::Seconds(1))
            .await
            .unwrap();
        assert!(store.get("key1").await.unwrap().is_some());

        sleep(Duration::from_millis(1100)).await;
        assert!(store.get("key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_ttl_beyond_clock_range() {
        let store = MemoryStore::new();

        store
            .set("key1", b"123".to_vec(), Ttl::Seconds(u64::MAX))
            .await
            .unwrap();
        assert_eq!(store.get("key1").await.unwrap(), Some(b"123".to_vec()));
    }

    #[tokio::test]
    async fn test_store_delete_and_clear() {
        let store = MemoryStore::new();

        store.set("key1", vec![1], Ttl::StoreDefault).await.unwrap();
        store.set("key2", vec![2], Ttl::StoreDefault).await.unwrap();

        store.delete("key1").await.unwrap();
        assert!(store.get("key1").await.unwrap().is_none());
        assert!(store.get("key2").await.unwrap().is_some());

        store.clear().await.unwrap();
        assert!(store.get("key2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("key", vec![7], Ttl::StoreDefault).await.unwrap();
        assert_eq!(other.get("key").await.unwrap(), Some(vec![7]));
    }
}
