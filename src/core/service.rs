//! Exchange rate service abstraction

use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery};
use async_trait::async_trait;

/// A single source able to answer, or decline, a rate query.
#[async_trait]
pub trait ExchangeRateService: Send + Sync {
    /// Name used in logs and in the rates it returns.
    fn name(&self) -> &str;

    /// Whether the service can answer `query` at all. A `false` here makes a
    /// chain move on to the next service without recording a failure.
    fn supports(&self, query: &ExchangeRateQuery) -> bool;

    async fn get_exchange_rate(&self, query: &ExchangeRateQuery)
    -> Result<ExchangeRate, RateError>;
}
