use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<fjall::Error> for CacheError {
    fn from(e: fjall::Error) -> Self {
        CacheError::Storage(e.to_string())
    }
}

/// Expiry requested for a cache write.
///
/// `StoreDefault` is what a configured TTL of `0` (or no TTL) turns into. Stores
/// disagree on what that means, so each implementation documents its own
/// interpretation instead of the caller picking one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    StoreDefault,
    Seconds(u64),
}

impl Ttl {
    /// Maps a TTL in seconds to a write expiry. Negative values mean the value
    /// must not be cached at all.
    pub fn from_seconds(seconds: i64) -> Option<Ttl> {
        match seconds {
            s if s < 0 => None,
            0 => Some(Ttl::StoreDefault),
            s => Some(Ttl::Seconds(s as u64)),
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Ttl::StoreDefault => None,
            Ttl::Seconds(s) => Some(Duration::from_secs(*s)),
        }
    }
}

/// Byte-oriented key/value store with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Ttl) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn clear(&self) -> Result<(), CacheError>;
}
