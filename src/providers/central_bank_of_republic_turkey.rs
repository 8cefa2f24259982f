use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, QueryKind, query_date};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use crate::providers::xml::{Document, parse_decimal};
use async_trait::async_trait;
use chrono::NaiveDate;

const NAME: &str = "central_bank_of_republic_turkey";

/// TCMB indicative rates, quoted in TRY. The forex selling rate is used.
pub struct CentralBankOfRepublicTurkey {
    base_url: String,
    transport: HttpTransport,
}

impl CentralBankOfRepublicTurkey {
    pub fn new(base_url: &str, transport: HttpTransport) -> Self {
        CentralBankOfRepublicTurkey {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    fn feed(query: &ExchangeRateQuery) -> String {
        match query.kind {
            QueryKind::Latest => "today.xml".to_string(),
            QueryKind::Historical(date) => {
                format!("{}/{}.xml", date.format("%Y%m"), date.format("%d%m%Y"))
            }
        }
    }
}

fn parse_rates(body: &str, query: &ExchangeRateQuery) -> Result<(f64, NaiveDate), RateError> {
    let doc = Document::parse(NAME, body)?;
    let date = doc
        .first("Tarih_Date")
        .and_then(|bulletin| bulletin.attr("Date"))
        .and_then(|date| NaiveDate::parse_from_str(date, "%m/%d/%Y").ok())
        .unwrap_or_else(|| query_date(query));

    let currency = doc
        .elements("Currency")
        .find(|e| e.attr("CurrencyCode") == Some(query.pair.base.as_str()))
        .ok_or_else(|| {
            RateError::provider(NAME, format!("unsupported currency {}", query.pair.base))
        })?;

    let selling = doc
        .child_text(currency, "ForexSelling")
        .and_then(parse_decimal)
        .ok_or_else(|| {
            RateError::provider(NAME, format!("no selling rate for {}", query.pair.base))
        })?;
    let unit = doc
        .child_text(currency, "Unit")
        .and_then(parse_decimal)
        .filter(|unit| *unit > 0.0)
        .unwrap_or(1.0);

    Ok((selling / unit, date))
}

#[async_trait]
impl ExchangeRateService for CentralBankOfRepublicTurkey {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, query: &ExchangeRateQuery) -> bool {
        query.pair.quote == "TRY"
    }

    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let url = endpoint(NAME, &self.base_url, &Self::feed(query), &[])?;
        let body = self.transport.get(NAME, url).await?.text().await?;
        let (value, date) = parse_rates(&body, query)?;

        Ok(ExchangeRate::new(query.pair.clone(), value, date, NAME))
    }
}
