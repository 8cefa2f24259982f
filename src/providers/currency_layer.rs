use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, QueryKind, query_date};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;

const NAME: &str = "currency_layer";

pub struct CurrencyLayer {
    base_url: String,
    access_key: String,
    enterprise: bool,
    transport: HttpTransport,
}

#[derive(Debug, Deserialize)]
struct CurrencyLayerResponse {
    success: bool,
    timestamp: Option<i64>,
    #[serde(default)]
    quotes: HashMap<String, f64>,
    error: Option<CurrencyLayerError>,
}

#[derive(Debug, Deserialize)]
struct CurrencyLayerError {
    code: Option<i64>,
    info: Option<String>,
}

impl CurrencyLayer {
    pub fn new(
        base_url: &str,
        access_key: &str,
        enterprise: bool,
        transport: HttpTransport,
    ) -> Self {
        CurrencyLayer {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
            enterprise,
            transport,
        }
    }

    fn url(&self, query: &ExchangeRateQuery) -> Result<Url, RateError> {
        let day = match query.kind {
            QueryKind::Latest => None,
            QueryKind::Historical(date) => Some(date.format("%Y-%m-%d").to_string()),
        };
        let mut params = vec![("access_key", self.access_key.as_str())];
        let path = match &day {
            Some(day) => {
                params.push(("date", day.as_str()));
                "historical"
            }
            None => "live",
        };
        params.push(("currencies", query.pair.quote.as_str()));
        if self.enterprise {
            params.push(("source", query.pair.base.as_str()));
        }
        endpoint(NAME, &self.base_url, path, &params)
    }
}

#[async_trait]
impl ExchangeRateService for CurrencyLayer {
    fn name(&self) -> &str {
        NAME
    }

    /// Free keys are tied to a USD source.
    fn supports(&self, query: &ExchangeRateQuery) -> bool {
        self.enterprise || query.pair.base == "USD"
    }

    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let data: CurrencyLayerResponse = self.transport.get_json(NAME, self.url(query)?).await?;

        if !data.success {
            let message = data
                .error
                .map(|e| format!("{} {}", e.code.unwrap_or_default(), e.info.unwrap_or_default()))
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(RateError::provider(NAME, message.trim()));
        }

        let key = format!("{}{}", query.pair.base, query.pair.quote);
        let value = data.quotes.get(&key).copied().ok_or_else(|| {
            RateError::invalid_response(NAME, format!("no quote for {key}"))
        })?;
        let date = match query.kind {
            QueryKind::Historical(date) => date,
            QueryKind::Latest => data
                .timestamp
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
                .map(|dt| dt.date_naive())
                .unwrap_or_else(|| query_date(query)),
        };

        Ok(ExchangeRate::new(query.pair.clone(), value, date, NAME))
    }
}
