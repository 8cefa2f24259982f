use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, QueryKind};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use crate::providers::xml::{Document, parse_decimal};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

const NAME: &str = "national_bank_of_romania";

/// BNR reference rates, quoted in RON. Historical queries read the yearly
/// archive.
pub struct NationalBankOfRomania {
    base_url: String,
    transport: HttpTransport,
}

impl NationalBankOfRomania {
    pub fn new(base_url: &str, transport: HttpTransport) -> Self {
        NationalBankOfRomania {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }
}

/// Reads `<Cube date=..><Rate currency=.. multiplier=..>` from a BNR feed.
fn parse_rates(body: &str, query: &ExchangeRateQuery) -> Result<(f64, NaiveDate), RateError> {
    let doc = Document::parse(NAME, body)?;

    let mut days = doc.elements("Cube");
    let day = match query.kind {
        QueryKind::Latest => days.next(),
        QueryKind::Historical(date) => {
            let wanted = date.format("%Y-%m-%d").to_string();
            days.find(|e| e.attr("date") == Some(wanted.as_str()))
        }
    }
    .ok_or_else(|| RateError::provider(NAME, format!("no reference rates for {query}")))?;

    let date = day
        .attr("date")
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .ok_or_else(|| RateError::invalid_response(NAME, "bad reference date"))?;

    let rate = doc
        .children(day)
        .find(|e| e.name == "Rate" && e.attr("currency") == Some(query.pair.base.as_str()))
        .ok_or_else(|| {
            RateError::provider(NAME, format!("unsupported currency {}", query.pair.base))
        })?;
    let value = parse_decimal(&rate.text)
        .ok_or_else(|| RateError::invalid_response(NAME, format!("bad rate {:?}", rate.text)))?;
    let multiplier = match rate.attr("multiplier") {
        Some(multiplier) => parse_decimal(multiplier)
            .filter(|m| *m > 0.0)
            .ok_or_else(|| RateError::invalid_response(NAME, "bad multiplier"))?,
        None => 1.0,
    };

    Ok((value / multiplier, date))
}

#[async_trait]
impl ExchangeRateService for NationalBankOfRomania {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, query: &ExchangeRateQuery) -> bool {
        query.pair.quote == "RON"
    }

    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let feed = match query.kind {
            QueryKind::Latest => "nbrfxrates.xml".to_string(),
            QueryKind::Historical(date) => {
                format!("files/xml/years/nbrfxrates{}.xml", date.year())
            }
        };
        let url = endpoint(NAME, &self.base_url, &feed, &[])?;
        let body = self.transport.get(NAME, url).await?.text().await?;
        let (value, date) = parse_rates(&body, query)?;

        Ok(ExchangeRate::new(query.pair.clone(), value, date, NAME))
    }
}
