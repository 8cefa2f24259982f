use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, QueryKind, query_date};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;

const NAME: &str = "open_exchange_rates";

pub struct OpenExchangeRates {
    base_url: String,
    app_id: String,
    enterprise: bool,
    transport: HttpTransport,
}

#[derive(Debug, Deserialize)]
struct OpenExchangeRatesResponse {
    #[serde(default)]
    error: bool,
    message: Option<String>,
    description: Option<String>,
    timestamp: Option<i64>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

impl OpenExchangeRates {
    pub fn new(base_url: &str, app_id: &str, enterprise: bool, transport: HttpTransport) -> Self {
        OpenExchangeRates {
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
            enterprise,
            transport,
        }
    }

    fn url(&self, query: &ExchangeRateQuery) -> Result<Url, RateError> {
        let path = match query.kind {
            QueryKind::Latest => "latest.json".to_string(),
            QueryKind::Historical(date) => format!("historical/{}.json", date.format("%Y-%m-%d")),
        };
        let mut params = vec![
            ("app_id", self.app_id.as_str()),
            ("symbols", query.pair.quote.as_str()),
        ];
        if self.enterprise {
            params.push(("base", query.pair.base.as_str()));
        }
        endpoint(NAME, &self.base_url, &path, &params)
    }
}

#[async_trait]
impl ExchangeRateService for OpenExchangeRates {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, query: &ExchangeRateQuery) -> bool {
        self.enterprise || query.pair.base == "USD"
    }

    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let data: OpenExchangeRatesResponse =
            self.transport.get_json(NAME, self.url(query)?).await?;

        if data.error {
            let message = data
                .description
                .or(data.message)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(RateError::provider(NAME, message));
        }

        let value = data.rates.get(&query.pair.quote).copied().ok_or_else(|| {
            RateError::invalid_response(NAME, format!("no rate for currency {}", query.pair.quote))
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
