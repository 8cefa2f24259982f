use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, query_date};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use crate::providers::xml::{Document, parse_decimal};
use async_trait::async_trait;

const NAME: &str = "webservicex";

/// WebserviceX currency converter. Replies with a one-element XML document,
/// `<double xmlns="...">1.1</double>`.
pub struct WebserviceX {
    base_url: String,
    transport: HttpTransport,
}

impl WebserviceX {
    pub fn new(base_url: &str, transport: HttpTransport) -> Self {
        WebserviceX {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }
}

fn parse_double(body: &str) -> Result<f64, RateError> {
    let doc = Document::parse(NAME, body)?;
    doc.first("double")
        .and_then(|element| parse_decimal(&element.text))
        .ok_or_else(|| RateError::invalid_response(NAME, format!("unexpected body: {body}")))
}

#[async_trait]
impl ExchangeRateService for WebserviceX {
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
            "CurrencyConvertor.asmx/ConversionRate",
            &[
                ("FromCurrency", query.pair.base.as_str()),
                ("ToCurrency", query.pair.quote.as_str()),
            ],
        )?;
        let body = self.transport.get(NAME, url).await?.text().await?;
        let value = parse_double(&body)?;

        Ok(ExchangeRate::new(
            query.pair.clone(),
            value,
            query_date(query),
            NAME,
        ))
    }
}
