use crate::core::cache::CacheStore;
use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, QueryKind};
use crate::core::service::ExchangeRateService;
use crate::store::CachePool;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Read-through cache in front of another service.
///
/// Failures of the inner service are returned as-is and never cached. Cache
/// read or write failures only cost a round trip to the inner service.
pub struct CachingService<T: ExchangeRateService> {
    inner: T,
    pool: CachePool<ExchangeRate>,
    ttl: Option<i64>,
    key_prefix: String,
}

impl<T: ExchangeRateService> CachingService<T> {
    pub fn new(inner: T, store: Arc<dyn CacheStore>, ttl: Option<i64>, key_prefix: &str) -> Self {
        Self {
            inner,
            pool: CachePool::new(store),
            ttl,
            key_prefix: key_prefix.to_string(),
        }
    }

    pub fn cache_key(&self, query: &ExchangeRateQuery) -> String {
        let when = match query.kind {
            QueryKind::Latest => "latest".to_string(),
            QueryKind::Historical(date) => date.format("%Y-%m-%d").to_string(),
        };
        format!(
            "{}{}-{}-{}",
            self.key_prefix, query.pair.base, query.pair.quote, when
        )
    }

    fn effective_ttl(&self, query: &ExchangeRateQuery) -> Option<i64> {
        query.options.cache_ttl.or(self.ttl)
    }
}

#[async_trait]
impl<T: ExchangeRateService> ExchangeRateService for CachingService<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn supports(&self, query: &ExchangeRateQuery) -> bool {
        self.inner.supports(query)
    }

    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let ttl = self.effective_ttl(query);
        if !query.options.cache || ttl.is_some_and(|t| t < 0) {
            debug!("Cache bypassed for {}", query);
            return self.inner.get_exchange_rate(query).await;
        }

        let key = self.cache_key(query);
        match self.pool.get_item(&key).await {
            Ok(item) => {
                if let Some(rate) = item.value {
                    debug!("Cache hit for rate: {}", key);
                    return Ok(rate);
                }
                debug!("Cache miss for rate: {}", key);
            }
            Err(e) => warn!("Cache read failed for {}: {}", key, e),
        }

        let rate = self.inner.get_exchange_rate(query).await?;
        if let Err(e) = self.pool.save(&key, Some(&rate), ttl).await {
            warn!("Cache write failed for {}: {}", key, e);
        }
        Ok(rate)
    }
}
