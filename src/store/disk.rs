use crate::core::cache::{CacheError, CacheStore, Ttl};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

const NEVER: u64 = u64::MAX;

/// Persistent store on a fjall partition.
///
/// Each value is prefixed with its expiry in unix milliseconds. A
/// [`Ttl::StoreDefault`] write uses the store's own `default_ttl`, which is
/// itself "never" when not configured.
pub struct DiskStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
    default_ttl: Option<Duration>,
}

impl DiskStore {
    pub fn open(path: &Path, default_ttl: Option<Duration>) -> Result<Self, CacheError> {
        std::fs::create_dir_all(path).map_err(|e| CacheError::Storage(e.to_string()))?;
        let keyspace = fjall::Config::new(path).open()?;
        Self::from_keyspace(&keyspace, "rates", default_ttl)
    }

    pub fn from_keyspace(
        keyspace: &Keyspace,
        partition: &str,
        default_ttl: Option<Duration>,
    ) -> Result<Self, CacheError> {
        let partition = keyspace.open_partition(partition, PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace: keyspace.clone(),
            partition,
            default_ttl,
        })
    }

    fn expiry_millis(&self, ttl: Ttl) -> u64 {
        let duration = match ttl {
            Ttl::StoreDefault => self.default_ttl,
            Ttl::Seconds(_) => ttl.as_duration(),
        };
        duration
            .and_then(|d| SystemTime::now().checked_add(d))
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(NEVER, |d| d.as_millis() as u64)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

fn decode(raw: &[u8]) -> Result<(u64, &[u8]), CacheError> {
    if raw.len() < 8 {
        return Err(CacheError::Storage("Truncated cache entry".to_string()));
    }
    let (header, value) = raw.split_at(8);
    let mut expiry = [0u8; 8];
    expiry.copy_from_slice(header);
    Ok((u64::from_be_bytes(expiry), value))
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let Some(raw) = self.partition.get(key)? else {
            debug!("Cache MISS for key: {:?}", key);
            return Ok(None);
        };
        let (expires_at, value) = decode(&raw)?;
        if expires_at != NEVER && expires_at <= now_millis() {
            debug!("Cache entry expired for key: {:?}", key);
            self.partition.remove(key)?;
            return Ok(None);
        }
        debug!("Cache HIT for key: {:?}", key);
        Ok(Some(value.to_vec()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Ttl) -> Result<(), CacheError> {
        let mut raw = Vec::with_capacity(value.len() + 8);
        raw.extend_from_slice(&self.expiry_millis(ttl).to_be_bytes());
        raw.extend_from_slice(&value);
        self.partition.insert(key, raw)?;
        self.keyspace.persist(PersistMode::Buffer)?;
        debug!("Cache PUT for key: {:?}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.partition.remove(key)?;
        debug!("Cache REMOVE for key: {:?}", key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        for key in self.partition.keys() {
            self.partition.remove(key?)?;
        }
        debug!("Cache CLEAR");
        Ok(())
    }
}
