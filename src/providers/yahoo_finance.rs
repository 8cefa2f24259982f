use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

const NAME: &str = "yahoo_finance";

pub struct YahooFinance {
    base_url: String,
    transport: HttpTransport,
}

impl YahooFinance {
    pub fn new(base_url: &str, transport: HttpTransport) -> Self {
        YahooFinance {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooCurrencyResponse {
    chart: CurrencyChartResult,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartResult {
    result: Option<Vec<CurrencyChartItem>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartItem {
    meta: CurrencyChartMeta,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
    #[serde(alias = "regularMarketTime")]
    regular_market_time: Option<i64>,
}

#[async_trait]
impl ExchangeRateService for YahooFinance {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, query: &ExchangeRateQuery) -> bool {
        !query.is_historical()
    }

    #[instrument(name = "YahooRateFetch", skip(self), fields(pair = %query.pair))]
    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let symbol = format!("{}{}=X", query.pair.base, query.pair.quote);
        let url = endpoint(NAME, &self.base_url, &format!("v8/finance/chart/{symbol}"), &[])?;

        let data: YahooCurrencyResponse = self.transport.get_json(NAME, url).await?;
        if let Some(error) = data.chart.error {
            return Err(RateError::provider(NAME, error.description));
        }

        let item = data
            .chart
            .result
            .and_then(|items| items.into_iter().next())
            .ok_or_else(|| {
                RateError::invalid_response(
                    NAME,
                    format!("No rate data found for currency pair: {symbol}"),
                )
            })?;
        debug!(rate = item.meta.regular_market_price, "Parsed Yahoo rate");

        let date = item
            .meta
            .regular_market_time
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(Utc::now)
            .date_naive();

        Ok(ExchangeRate::new(
            query.pair.clone(),
            item.meta.regular_market_price,
            date,
            NAME,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate::CurrencyPair;
    use crate::providers::transport::{DefaultRequestFactory, default_client};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(status: u16, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/EURUSD=X"))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider(mock_server: &MockServer) -> YahooFinance {
        let transport = HttpTransport::new(default_client().unwrap(), Arc::new(DefaultRequestFactory));
        YahooFinance::new(&mock_server.uri(), transport)
    }

    fn latest() -> ExchangeRateQuery {
        ExchangeRateQuery::latest(CurrencyPair::new("EUR", "USD"))
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_response = r#"{
            "chart": {
                "result": [
                    {
                        "meta": {
                            "regularMarketPrice": 1.2345,
                            "regularMarketTime": 1471910400
                        }
                    }
                ]
            }
        }"#;
        let mock_server = create_mock_server(200, mock_response).await;

        let rate = provider(&mock_server)
            .get_exchange_rate(&latest())
            .await
            .expect("Failed to get rate");
        assert_eq!(rate.value, 1.2345);
        assert_eq!(rate.date, NaiveDate::from_ymd_opt(2016, 8, 23).unwrap());
        assert_eq!(rate.provider, "yahoo_finance");
    }

    #[tokio::test]
    async fn test_no_currency_rate_found() {
        let mock_server = create_mock_server(200, r#"{"chart": {"result": []}}"#).await;

        let result = provider(&mock_server).get_exchange_rate(&latest()).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Invalid response from yahoo_finance: No rate data found for currency pair: EURUSD=X"
        );
    }

    #[tokio::test]
    async fn test_chart_error_is_reported() {
        let mock_response =
            r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}}"#;
        let mock_server = create_mock_server(200, mock_response).await;

        let result = provider(&mock_server).get_exchange_rate(&latest()).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "yahoo_finance returned an error: No data found"
        );
    }

    #[tokio::test]
    async fn test_yahoo_api_error_response() {
        let mock_server = create_mock_server(500, "").await;

        let result = provider(&mock_server).get_exchange_rate(&latest()).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "yahoo_finance returned an error: HTTP error: 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_yahoo_api_malformed_response() {
        let mock_server = create_mock_server(200, r#"{"chart": {"results": []}}"#).await;

        let result = provider(&mock_server).get_exchange_rate(&latest()).await;
        let message = result.unwrap_err().to_string();
        assert_eq!(
            message,
            "Invalid response from yahoo_finance: No rate data found for currency pair: EURUSD=X"
        );
    }

    #[test]
    fn test_historical_queries_are_declined() {
        let transport = HttpTransport::new(default_client().unwrap(), Arc::new(DefaultRequestFactory));
        let provider = YahooFinance::new("http://localhost", transport);
        let date = NaiveDate::from_ymd_opt(2016, 8, 23).unwrap();
        assert!(provider.supports(&latest()));
        assert!(!provider.supports(&ExchangeRateQuery::historical(
            CurrencyPair::new("EUR", "USD"),
            date
        )));
    }
}
