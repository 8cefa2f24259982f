use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, query_date};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;

const NAME: &str = "forge";

/// 1Forge conversion endpoint; latest rates only.
pub struct Forge {
    base_url: String,
    api_key: String,
    transport: HttpTransport,
}

#[derive(Debug, Deserialize)]
struct ForgeResponse {
    #[serde(default)]
    error: bool,
    message: Option<String>,
    value: Option<f64>,
    timestamp: Option<i64>,
}

impl Forge {
    pub fn new(base_url: &str, api_key: &str, transport: HttpTransport) -> Self {
        Forge {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            transport,
        }
    }
}

#[async_trait]
impl ExchangeRateService for Forge {
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
        let url = endpoint(
            NAME,
            &self.base_url,
            "convert",
            &[
                ("from", query.pair.base.as_str()),
                ("to", query.pair.quote.as_str()),
                ("quantity", "1"),
                ("api_key", self.api_key.as_str()),
            ],
        )?;
        let data: ForgeResponse = self.transport.get_json(NAME, url).await?;

        if data.error {
            return Err(RateError::provider(
                NAME,
                data.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        let value = data
            .value
            .ok_or_else(|| RateError::invalid_response(NAME, "missing value"))?;
        let date = data
            .timestamp
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .map(|dt| dt.date_naive())
            .unwrap_or_else(|| query_date(query));

        Ok(ExchangeRate::new(query.pair.clone(), value, date, NAME))
    }
}
