//! Bootstrap: turns a [`SwapConfig`] into a ready-to-query [`Swap`].

use crate::core::cache::CacheStore;
use crate::core::config::SwapConfig;
use crate::core::error::{BuildError, RateError};
use crate::core::rate::{CurrencyPair, ExchangeRate, ExchangeRateQuery};
use crate::core::service::ExchangeRateService;
use crate::providers::caching::CachingService;
use crate::providers::chain::Chain;
use crate::providers::factory;
use crate::providers::registry;
use crate::providers::transport::{
    DefaultRequestFactory, HttpTransport, RequestFactory, default_client,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Named collaborators the configuration can refer to, plus services
/// registered in code that run after the configured ones.
#[derive(Clone, Default)]
pub struct Dependencies {
    http_clients: HashMap<String, reqwest::Client>,
    request_factories: HashMap<String, Arc<dyn RequestFactory>>,
    cache_stores: HashMap<String, Arc<dyn CacheStore>>,
    tagged: Vec<Arc<dyn ExchangeRateService>>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_client(mut self, name: &str, client: reqwest::Client) -> Self {
        self.http_clients.insert(name.to_string(), client);
        self
    }

    pub fn with_request_factory(mut self, name: &str, factory: Arc<dyn RequestFactory>) -> Self {
        self.request_factories.insert(name.to_string(), factory);
        self
    }

    pub fn with_cache_store(mut self, name: &str, store: Arc<dyn CacheStore>) -> Self {
        self.cache_stores.insert(name.to_string(), store);
        self
    }

    /// Appends a service to the end of every chain built from these
    /// dependencies, in registration order.
    pub fn tag_service(mut self, service: Arc<dyn ExchangeRateService>) -> Self {
        self.tagged.push(service);
        self
    }

    fn cache_store(&self, name: &str) -> Result<Arc<dyn CacheStore>, BuildError> {
        self.cache_stores
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::InvalidCacheConfiguration {
                name: name.to_string(),
                reason: "no cache store is registered under that name".to_string(),
            })
    }

    fn http_client(&self, name: &str) -> Result<reqwest::Client, BuildError> {
        self.http_clients
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::UnresolvedDependency {
                kind: "http client",
                name: name.to_string(),
            })
    }

    fn request_factory(&self, name: &str) -> Result<Arc<dyn RequestFactory>, BuildError> {
        self.request_factories
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::UnresolvedDependency {
                kind: "request factory",
                name: name.to_string(),
            })
    }
}

/// A built resolver. Cloning is cheap and every clone shares the same chain
/// and cache.
#[derive(Clone)]
pub struct Swap {
    resolver: Arc<dyn ExchangeRateService>,
    services: Arc<[String]>,
    cached: bool,
}

impl Swap {
    pub async fn latest(&self, pair: CurrencyPair) -> Result<ExchangeRate, RateError> {
        self.query(&ExchangeRateQuery::latest(pair)).await
    }

    pub async fn historical(
        &self,
        pair: CurrencyPair,
        date: NaiveDate,
    ) -> Result<ExchangeRate, RateError> {
        self.query(&ExchangeRateQuery::historical(pair, date)).await
    }

    pub async fn query(&self, query: &ExchangeRateQuery) -> Result<ExchangeRate, RateError> {
        debug!("Resolving {}", query);
        self.resolver.get_exchange_rate(query).await
    }

    /// Service names in the order they are consulted.
    pub fn services(&self) -> &[String] {
        &self.services
    }

    pub fn is_cached(&self) -> bool {
        self.cached
    }
}

/// Validates `config` and builds the resolver it describes.
///
/// Nothing is returned unless every enabled service was constructed, and no
/// network request is made.
pub fn build(config: &SwapConfig, deps: &Dependencies) -> Result<Swap, BuildError> {
    let enabled: Vec<_> = config.services.enabled().collect();
    let mut needs_http = false;
    for spec in &enabled {
        needs_http |= registry::resolve(&spec.name)?.needs_http;
    }

    let cache = config.cache_ref()?;
    let store = cache
        .as_ref()
        .map(|cache| deps.cache_store(&cache.store))
        .transpose()?;
    let transport = resolve_transport(config, deps, needs_http)?;

    let mut services = Vec::with_capacity(enabled.len() + deps.tagged.len());
    for spec in enabled {
        services.push(factory::create(spec, transport.as_ref())?);
    }
    services.extend(deps.tagged.iter().cloned());

    let chain = Chain::new(services);
    if chain.is_empty() {
        warn!("No exchange rate service is enabled; every query will be unsupported");
    }
    let names: Arc<[String]> = chain.names().into_iter().map(String::from).collect();
    info!(services = ?names, cached = store.is_some(), "Built exchange rate chain");

    let resolver: Arc<dyn ExchangeRateService> = match (store, &cache) {
        (Some(store), Some(cache)) => Arc::new(CachingService::new(
            chain,
            store,
            config.cache_ttl(cache),
            config.options.cache_key_prefix(),
        )),
        _ => Arc::new(chain),
    };

    Ok(Swap {
        cached: cache.is_some(),
        resolver,
        services: names,
    })
}

/// Named references are checked even when no service needs them. The
/// default client is only built when one does.
fn resolve_transport(
    config: &SwapConfig,
    deps: &Dependencies,
    needs_http: bool,
) -> Result<Option<HttpTransport>, BuildError> {
    let client = config
        .http_client
        .as_deref()
        .map(|name| deps.http_client(name))
        .transpose()?;
    let requests = config
        .request_factory
        .as_deref()
        .map(|name| deps.request_factory(name))
        .transpose()?;

    if !needs_http {
        return Ok(None);
    }
    let client = match client {
        Some(client) => client,
        None => default_client()?,
    };
    let requests = requests.unwrap_or_else(|| Arc::new(DefaultRequestFactory));
    Ok(Some(HttpTransport::new(client, requests)))
}

/// Builds on first use and hands every caller the same [`Swap`].
pub struct LazySwap {
    config: SwapConfig,
    deps: Dependencies,
    cell: OnceCell<Swap>,
}

impl LazySwap {
    pub fn new(config: SwapConfig, deps: Dependencies) -> Self {
        Self {
            config,
            deps,
            cell: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Result<&Swap, BuildError> {
        self.cell
            .get_or_try_init(|| async { build(&self.config, &self.deps) })
            .await
    }
}
