use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, QueryKind};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use crate::providers::xml::{Document, parse_decimal};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

const NAME: &str = "european_central_bank";

/// Euro foreign exchange reference rates. Only EUR based pairs, and
/// historical queries only reach back 90 days.
pub struct EuropeanCentralBank {
    base_url: String,
    transport: HttpTransport,
}

impl EuropeanCentralBank {
    pub fn new(base_url: &str, transport: HttpTransport) -> Self {
        EuropeanCentralBank {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }
}

#[async_trait]
impl ExchangeRateService for EuropeanCentralBank {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, query: &ExchangeRateQuery) -> bool {
        query.pair.base == "EUR"
    }

    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let feed = match query.kind {
            QueryKind::Latest => "eurofxref-daily.xml",
            QueryKind::Historical(_) => "eurofxref-hist-90d.xml",
        };
        let url = endpoint(NAME, &self.base_url, feed, &[])?;
        let body = self.transport.get(NAME, url).await?.text().await?;
        let doc = Document::parse(NAME, &body)?;

        let mut days = doc.elements("Cube").filter(|e| e.attr("time").is_some());
        let day = match query.kind {
            QueryKind::Latest => days.next(),
            QueryKind::Historical(date) => {
                let wanted = date.format("%Y-%m-%d").to_string();
                days.find(|e| e.attr("time") == Some(wanted.as_str()))
            }
        }
        .ok_or_else(|| RateError::provider(NAME, format!("no reference rates for {query}")))?;

        let date = day
            .attr("time")
            .and_then(|time| NaiveDate::parse_from_str(time, "%Y-%m-%d").ok())
            .ok_or_else(|| RateError::invalid_response(NAME, "bad reference date"))?;
        debug!(%date, "Reading ECB reference rates");

        let value = doc
            .children(day)
            .find(|e| e.attr("currency") == Some(query.pair.quote.as_str()))
            .and_then(|e| e.attr("rate"))
            .and_then(parse_decimal)
            .ok_or_else(|| {
                RateError::provider(NAME, format!("unsupported currency {}", query.pair.quote))
            })?;

        Ok(ExchangeRate::new(query.pair.clone(), value, date, NAME))
    }
}
