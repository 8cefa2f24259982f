use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, query_date};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;

const NAME: &str = "cryptonator";

/// Cryptonator ticker; latest rates only.
pub struct Cryptonator {
    base_url: String,
    transport: HttpTransport,
}

#[derive(Debug, Deserialize)]
struct CryptonatorResponse {
    success: bool,
    #[serde(default)]
    error: String,
    ticker: Option<Ticker>,
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Ticker {
    price: String,
}

impl Cryptonator {
    pub fn new(base_url: &str, transport: HttpTransport) -> Self {
        Cryptonator {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }
}

#[async_trait]
impl ExchangeRateService for Cryptonator {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, query: &ExchangeRateQuery) -> bool {
        !query.is_historical()
    }

    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let ticker = format!(
            "ticker/{}-{}",
            query.pair.base.to_lowercase(),
            query.pair.quote.to_lowercase()
        );
        let url = endpoint(NAME, &self.base_url, &ticker, &[])?;
        let data: CryptonatorResponse = self.transport.get_json(NAME, url).await?;

        if !data.success {
            return Err(RateError::provider(NAME, data.error));
        }
        let ticker = data
            .ticker
            .ok_or_else(|| RateError::invalid_response(NAME, "missing ticker"))?;
        let value: f64 = ticker.price.parse().map_err(|e| {
            RateError::invalid_response(NAME, format!("bad price {}: {e}", ticker.price))
        })?;
        let date = data
            .timestamp
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .map(|dt| dt.date_naive())
            .unwrap_or_else(|| query_date(query));

        Ok(ExchangeRate::new(query.pair.clone(), value, date, NAME))
    }
}
