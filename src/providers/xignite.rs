use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, QueryKind, query_date};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;

const NAME: &str = "xignite";

pub struct Xignite {
    base_url: String,
    token: String,
    transport: HttpTransport,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XigniteRate {
    outcome: String,
    message: Option<String>,
    date: Option<String>,
    bid: Option<f64>,
    average: Option<f64>,
}

impl Xignite {
    pub fn new(base_url: &str, token: &str, transport: HttpTransport) -> Self {
        Xignite {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            transport,
        }
    }

    fn url(&self, query: &ExchangeRateQuery) -> Result<Url, RateError> {
        let symbol = format!("{}{}", query.pair.base, query.pair.quote);
        match query.kind {
            QueryKind::Latest => endpoint(
                NAME,
                &self.base_url,
                "xGlobalCurrencies.json/GetRealTimeRates",
                &[
                    ("Symbols", symbol.as_str()),
                    ("_fields", "Outcome,Message,Symbol,Date,Time,Bid"),
                    ("_token", self.token.as_str()),
                ],
            ),
            QueryKind::Historical(date) => {
                let as_of = date.format("%m/%d/%Y").to_string();
                endpoint(
                    NAME,
                    &self.base_url,
                    "xGlobalCurrencies.json/GetHistoricalRates",
                    &[
                        ("Symbols", symbol.as_str()),
                        ("AsOfDate", as_of.as_str()),
                        ("_token", self.token.as_str()),
                        ("FixingTime", ""),
                        ("PriceType", "Mid"),
                    ],
                )
            }
        }
    }
}

#[async_trait]
impl ExchangeRateService for Xignite {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, _query: &ExchangeRateQuery) -> bool {
        true
    }

    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let data: Vec<XigniteRate> = self.transport.get_json(NAME, self.url(query)?).await?;
        let item = data
            .into_iter()
            .next()
            .ok_or_else(|| RateError::invalid_response(NAME, "empty response"))?;

        if item.outcome != "Success" {
            return Err(RateError::provider(
                NAME,
                item.message.unwrap_or(item.outcome),
            ));
        }

        let value = match query.kind {
            QueryKind::Latest => item.bid,
            QueryKind::Historical(_) => item.average,
        }
        .ok_or_else(|| RateError::invalid_response(NAME, "missing rate value"))?;
        let date = item
            .date
            .and_then(|d| NaiveDate::parse_from_str(&d, "%m/%d/%Y").ok())
            .unwrap_or_else(|| query_date(query));

        Ok(ExchangeRate::new(query.pair.clone(), value, date, NAME))
    }
}
