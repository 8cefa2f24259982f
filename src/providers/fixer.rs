use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, QueryKind, query_date};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;

/// Fixer and exchangeratesapi.io share one API: EUR is the only base on free
/// plans, any base on enterprise ones.
pub struct Fixer {
    name: &'static str,
    base_url: String,
    access_key: String,
    enterprise: bool,
    transport: HttpTransport,
}

#[derive(Debug, Deserialize)]
struct FixerResponse {
    success: bool,
    date: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
    error: Option<FixerError>,
}

#[derive(Debug, Deserialize)]
struct FixerError {
    code: Option<i64>,
    info: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl Fixer {
    pub fn new(
        base_url: &str,
        access_key: &str,
        enterprise: bool,
        transport: HttpTransport,
    ) -> Self {
        Self::named("fixer", base_url, access_key, enterprise, transport)
    }

    pub fn exchange_rates_api(
        base_url: &str,
        access_key: &str,
        enterprise: bool,
        transport: HttpTransport,
    ) -> Self {
        Self::named(
            "exchange_rates_api",
            base_url,
            access_key,
            enterprise,
            transport,
        )
    }

    fn named(
        name: &'static str,
        base_url: &str,
        access_key: &str,
        enterprise: bool,
        transport: HttpTransport,
    ) -> Self {
        Fixer {
            name,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
            enterprise,
            transport,
        }
    }

    fn url(&self, query: &ExchangeRateQuery) -> Result<Url, RateError> {
        let path = match query.kind {
            QueryKind::Latest => "latest".to_string(),
            QueryKind::Historical(date) => date.format("%Y-%m-%d").to_string(),
        };
        let mut params = vec![
            ("access_key", self.access_key.as_str()),
            ("symbols", query.pair.quote.as_str()),
        ];
        if self.enterprise {
            params.push(("base", query.pair.base.as_str()));
        }
        endpoint(self.name, &self.base_url, &path, &params)
    }
}

#[async_trait]
impl ExchangeRateService for Fixer {
    fn name(&self) -> &str {
        self.name
    }

    fn supports(&self, query: &ExchangeRateQuery) -> bool {
        self.enterprise || query.pair.base == "EUR"
    }

    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let data: FixerResponse = self.transport.get_json(self.name, self.url(query)?).await?;

        if !data.success {
            let message = data
                .error
                .map(|e| {
                    let info = e.info.or(e.kind).unwrap_or_default();
                    format!("{} {}", e.code.unwrap_or_default(), info)
                })
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(RateError::provider(self.name, message.trim()));
        }

        let value = data.rates.get(&query.pair.quote).copied().ok_or_else(|| {
            RateError::invalid_response(
                self.name,
                format!("no rate for currency {}", query.pair.quote),
            )
        })?;
        let date = data
            .date
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
            .unwrap_or_else(|| query_date(query));

        Ok(ExchangeRate::new(query.pair.clone(), value, date, self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate::CurrencyPair;
    use crate::providers::transport::{DefaultRequestFactory, default_client};
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> HttpTransport {
        HttpTransport::new(default_client().unwrap(), Arc::new(DefaultRequestFactory))
    }

    #[tokio::test]
    async fn test_latest_rate() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("access_key", "secret"))
            .and(query_param("symbols", "USD"))
            .and(query_param_is_missing("base"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success": true, "base": "EUR", "date": "2016-08-26", "rates": {"USD": 1.1240}}"#,
            ))
            .mount(&mock_server)
            .await;

        let fixer = Fixer::new(&mock_server.uri(), "secret", false, transport());
        let query = ExchangeRateQuery::latest(CurrencyPair::new("EUR", "USD"));
        let rate = fixer.get_exchange_rate(&query).await.unwrap();

        assert_eq!(rate.value, 1.1240);
        assert_eq!(rate.date, NaiveDate::from_ymd_opt(2016, 8, 26).unwrap());
        assert_eq!(rate.provider, "fixer");
    }

    #[tokio::test]
    async fn test_historical_rate_with_enterprise_base() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2000-01-03"))
            .and(query_param("base", "USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success": true, "historical": true, "date": "2000-01-03", "rates": {"AED": 3.67}}"#,
            ))
            .mount(&mock_server)
            .await;

        let service = Fixer::exchange_rates_api(&mock_server.uri(), "secret", true, transport());
        let date = NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
        let query = ExchangeRateQuery::historical(CurrencyPair::new("USD", "AED"), date);

        assert!(service.supports(&query));
        let rate = service.get_exchange_rate(&query).await.unwrap();
        assert_eq!(rate.value, 3.67);
        assert_eq!(rate.provider, "exchange_rates_api");
    }

    #[tokio::test]
    async fn test_error_payload() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success": false, "error": {"code": 101, "type": "invalid_access_key", "info": "You have not supplied a valid API Access Key."}}"#,
            ))
            .mount(&mock_server)
            .await;

        let fixer = Fixer::new(&mock_server.uri(), "bad", false, transport());
        let query = ExchangeRateQuery::latest(CurrencyPair::new("EUR", "USD"));
        let err = fixer.get_exchange_rate(&query).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "fixer returned an error: 101 You have not supplied a valid API Access Key."
        );
    }

    #[tokio::test]
    async fn test_access_key_with_reserved_characters() {
        let key = "ab&symbols=GBP#";
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("access_key", key))
            .and(query_param("symbols", "USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"success": true, "date": "2016-08-26", "rates": {"USD": 1.1240}}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fixer = Fixer::new(&mock_server.uri(), key, false, transport());
        let query = ExchangeRateQuery::latest(CurrencyPair::new("EUR", "USD"));
        let url = fixer.url(&query).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [
                ("access_key".to_string(), key.to_string()),
                ("symbols".to_string(), "USD".to_string()),
            ]
        );

        let rate = fixer.get_exchange_rate(&query).await.unwrap();
        assert_eq!(rate.value, 1.1240);
    }

    #[test]
    fn test_free_plan_only_supports_eur_base() {
        let fixer = Fixer::new("http://localhost", "secret", false, transport());
        assert!(fixer.supports(&ExchangeRateQuery::latest(CurrencyPair::new("EUR", "USD"))));
        assert!(!fixer.supports(&ExchangeRateQuery::latest(CurrencyPair::new("USD", "EUR"))));
    }
}
