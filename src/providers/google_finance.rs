use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, query_date};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use async_trait::async_trait;

const NAME: &str = "google_finance";

/// Google Finance currency converter page. The rate is scraped from the
/// `<span class=bld>1.1174 USD</span>` result, so latest rates only.
pub struct GoogleFinance {
    base_url: String,
    transport: HttpTransport,
}

impl GoogleFinance {
    pub fn new(base_url: &str, transport: HttpTransport) -> Self {
        GoogleFinance {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }
}

fn parse_converter_page(body: &str, quote: &str) -> Result<f64, RateError> {
    let start = body
        .find("<span class=bld>")
        .map(|i| i + "<span class=bld>".len())
        .ok_or_else(|| RateError::provider(NAME, "the currency pair is not supported"))?;
    let end = body[start..]
        .find("</span>")
        .ok_or_else(|| RateError::invalid_response(NAME, "unterminated result"))?;

    let result = body[start..start + end].trim();
    match result.split_whitespace().collect::<Vec<_>>().as_slice() {
        [amount, currency] if *currency == quote => amount
            .parse()
            .map_err(|_| RateError::invalid_response(NAME, format!("bad amount {amount}"))),
        _ => Err(RateError::invalid_response(
            NAME,
            format!("unexpected result {result:?}"),
        )),
    }
}

#[async_trait]
impl ExchangeRateService for GoogleFinance {
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
            "converter",
            &[
                ("a", "1"),
                ("from", query.pair.base.as_str()),
                ("to", query.pair.quote.as_str()),
            ],
        )?;
        let body = self.transport.get(NAME, url).await?.text().await?;
        let value = parse_converter_page(&body, &query.pair.quote)?;

        Ok(ExchangeRate::new(
            query.pair.clone(),
            value,
            query_date(query),
            NAME,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate::CurrencyPair;
    use crate::providers::transport::{DefaultRequestFactory, default_client};
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><body><div id=currency_converter_result>1 EUR = <span class=bld>1.1321 USD</span>
<input type=submit value="Convert"></div></body></html>"#;

    #[test]
    fn test_parse_converter_page() {
        assert_eq!(parse_converter_page(PAGE, "USD").unwrap(), 1.1321);

        let empty = "<html><div id=currency_converter_result></div></html>";
        let err = parse_converter_page(empty, "USD").unwrap_err();
        assert!(matches!(err, RateError::Provider { .. }));

        assert!(parse_converter_page(PAGE, "GBP").is_err());
        assert!(parse_converter_page("<span class=bld>n/a USD</span>", "USD").is_err());
    }

    #[tokio::test]
    async fn test_latest_rate() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/converter"))
            .and(query_param("a", "1"))
            .and(query_param("from", "EUR"))
            .and(query_param("to", "USD"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport =
            HttpTransport::new(default_client().unwrap(), Arc::new(DefaultRequestFactory));
        let service = GoogleFinance::new(&mock_server.uri(), transport);
        let rate = service
            .get_exchange_rate(&ExchangeRateQuery::latest(CurrencyPair::new("EUR", "USD")))
            .await
            .unwrap();
        assert_eq!(rate.value, 1.1321);
        assert_eq!(rate.provider, "google_finance");
    }
}
