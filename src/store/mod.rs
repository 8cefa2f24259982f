pub mod disk;
pub mod memory;

use crate::core::cache::{CacheError, CacheStore, Ttl};
use futures::future::join_all;
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// Stored in place of an intentionally empty value. JSON encoding never
/// produces a bare identifier, so no real value can serialise to this.
pub const NULL_VALUE: &[u8] = b"__RATESWAP_NULL__";

/// Result of a pool lookup. A hit may carry no value when `None` was saved.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem<V> {
    pub key: String,
    pub hit: bool,
    pub value: Option<V>,
}

/// Typed view over a [`CacheStore`].
///
/// Values are JSON encoded. Saving `None` writes [`NULL_VALUE`] so that a
/// later read reports a hit with no value instead of a miss.
pub struct CachePool<V> {
    store: Arc<dyn CacheStore>,
    _marker: PhantomData<fn() -> V>,
}

impl<V> Clone for CachePool<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<V> CachePool<V>
where
    V: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub async fn get_item(&self, key: &str) -> Result<CacheItem<V>, CacheError> {
        let value = match self.store.get(key).await? {
            None => None,
            Some(raw) if raw == NULL_VALUE => Some(None),
            Some(raw) => Some(Some(serde_json::from_slice(&raw)?)),
        };
        Ok(CacheItem {
            key: key.to_string(),
            hit: value.is_some(),
            value: value.flatten(),
        })
    }

    /// Returns the cached value, or `default` on a miss or a saved `None`.
    pub async fn get(&self, key: &str, default: Option<V>) -> Result<Option<V>, CacheError> {
        Ok(self.get_item(key).await?.value.or(default))
    }

    pub async fn get_many(&self, keys: &[&str]) -> Result<Vec<CacheItem<V>>, CacheError> {
        join_all(keys.iter().map(|key| self.get_item(key)))
            .await
            .into_iter()
            .collect()
    }

    pub async fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get_item(key).await?.hit)
    }

    /// Saves `value` under `key`. A negative TTL refuses the write and
    /// returns `false`; `None` or `0` leaves expiry to the store.
    pub async fn save(
        &self,
        key: &str,
        value: Option<&V>,
        ttl_seconds: Option<i64>,
    ) -> Result<bool, CacheError> {
        let Some(ttl) = Ttl::from_seconds(ttl_seconds.unwrap_or(0)) else {
            debug!("Refusing to cache {:?} with negative ttl", key);
            return Ok(false);
        };
        let raw = match value {
            Some(value) => serde_json::to_vec(value)?,
            None => NULL_VALUE.to_vec(),
        };
        self.store.set(key, raw, ttl).await?;
        Ok(true)
    }

    pub async fn save_many(
        &self,
        values: &[(&str, Option<&V>)],
        ttl_seconds: Option<i64>,
    ) -> Result<bool, CacheError> {
        let mut saved = true;
        for (key, value) in values {
            saved &= self.save(key, *value, ttl_seconds).await?;
        }
        Ok(saved)
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await
    }

    pub async fn delete_many(&self, keys: &[&str]) -> Result<(), CacheError> {
        for key in keys {
            self.store.delete(key).await?;
        }
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), CacheError> {
        self.store.clear().await
    }
}
