use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery, QueryKind};
use crate::core::service::ExchangeRateService;
use crate::providers::transport::{HttpTransport, endpoint};
use crate::providers::xml::parse_decimal;
use async_trait::async_trait;
use chrono::NaiveDate;

const NAME: &str = "central_bank_of_czech_republic";

/// CNB daily fixing, quoted in CZK. The feed is pipe separated text:
///
/// ```text
/// 23.08.2016 #162
/// země|měna|množství|kód|kurz
/// Austrálie|dolar|1|AUD|18,400
/// ```
pub struct CentralBankOfCzechRepublic {
    base_url: String,
    transport: HttpTransport,
}

impl CentralBankOfCzechRepublic {
    pub fn new(base_url: &str, transport: HttpTransport) -> Self {
        CentralBankOfCzechRepublic {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }
}

fn parse_fixing(body: &str, currency: &str) -> Result<(f64, NaiveDate), RateError> {
    let mut lines = body.lines();
    let date = lines
        .next()
        .and_then(|header| header.split_whitespace().next())
        .and_then(|date| NaiveDate::parse_from_str(date, "%d.%m.%Y").ok())
        .ok_or_else(|| RateError::invalid_response(NAME, "missing fixing date"))?;

    // second line holds the column names
    for line in lines.skip(1) {
        let columns: Vec<&str> = line.split('|').collect();
        let [_, _, amount, code, rate] = columns.as_slice() else {
            continue;
        };
        if *code != currency {
            continue;
        }
        let amount = parse_decimal(amount)
            .filter(|amount| *amount > 0.0)
            .ok_or_else(|| RateError::invalid_response(NAME, format!("bad amount in {line:?}")))?;
        let rate = parse_decimal(rate)
            .ok_or_else(|| RateError::invalid_response(NAME, format!("bad rate in {line:?}")))?;
        return Ok((rate / amount, date));
    }

    Err(RateError::provider(
        NAME,
        format!("unsupported currency {currency}"),
    ))
}

#[async_trait]
impl ExchangeRateService for CentralBankOfCzechRepublic {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, query: &ExchangeRateQuery) -> bool {
        query.pair.quote == "CZK"
    }

    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let day = match query.kind {
            QueryKind::Latest => None,
            QueryKind::Historical(date) => Some(date.format("%d.%m.%Y").to_string()),
        };
        let params: Vec<(&str, &str)> = day.iter().map(|day| ("date", day.as_str())).collect();
        let url = endpoint(NAME, &self.base_url, "denni_kurz.txt", &params)?;

        let body = self.transport.get(NAME, url).await?.text().await?;
        let (value, date) = parse_fixing(&body, &query.pair.base)?;

        Ok(ExchangeRate::new(query.pair.clone(), value, date, NAME))
    }
}
