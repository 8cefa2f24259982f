//! Core abstractions: rates, services, cache stores, configuration and errors

pub mod cache;
pub mod config;
pub mod error;
pub mod log;
pub mod rate;
pub mod service;

// Re-export main types for cleaner imports
pub use cache::{CacheError, CacheStore, Ttl};
pub use config::{ServiceEntry, ServiceList, ServiceSpec, SwapConfig, SwapOptions};
pub use error::{BuildError, RateError};
pub use rate::{CurrencyPair, ExchangeRate, ExchangeRateQuery, QueryKind, QueryOptions};
pub use service::ExchangeRateService;
