//! Currency pairs, rate queries and their results

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: String,
    pub quote: String,
}

impl CurrencyPair {
    pub fn new(base: &str, quote: &str) -> Self {
        CurrencyPair {
            base: base.to_uppercase(),
            quote: quote.to_uppercase(),
        }
    }

    /// True when both sides are the same currency; every service answers 1.
    pub fn is_identical(&self) -> bool {
        self.base == self.quote
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() >= 3 && code.chars().all(|c| c.is_ascii_alphanumeric())
}

impl FromStr for CurrencyPair {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .split_once('/')
            .ok_or_else(|| anyhow!("Invalid currency pair: {}", s))?;
        let (base, quote) = (base.trim(), quote.trim());
        if !is_currency_code(base) || !is_currency_code(quote) {
            return Err(anyhow!("Invalid currency pair: {}", s));
        }
        Ok(CurrencyPair::new(base, quote))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Latest,
    Historical(NaiveDate),
}

/// Per-query overrides of the cache behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub cache: bool,
    pub cache_ttl: Option<i64>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            cache: true,
            cache_ttl: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRateQuery {
    pub pair: CurrencyPair,
    pub kind: QueryKind,
    pub options: QueryOptions,
}

impl ExchangeRateQuery {
    pub fn latest(pair: CurrencyPair) -> Self {
        ExchangeRateQuery {
            pair,
            kind: QueryKind::Latest,
            options: QueryOptions::default(),
        }
    }

    pub fn historical(pair: CurrencyPair, date: NaiveDate) -> Self {
        ExchangeRateQuery {
            pair,
            kind: QueryKind::Historical(date),
            options: QueryOptions::default(),
        }
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn is_historical(&self) -> bool {
        matches!(self.kind, QueryKind::Historical(_))
    }
}

impl Display for ExchangeRateQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            QueryKind::Latest => write!(f, "{} (latest)", self.pair),
            QueryKind::Historical(date) => write!(f, "{} ({})", self.pair, date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub pair: CurrencyPair,
    pub value: f64,
    pub date: NaiveDate,
    pub provider: String,
}

impl ExchangeRate {
    pub fn new(pair: CurrencyPair, value: f64, date: NaiveDate, provider: &str) -> Self {
        ExchangeRate {
            pair,
            value,
            date,
            provider: provider.to_string(),
        }
    }
}

/// Date a rate is reported for when the service does not say.
pub(crate) fn query_date(query: &ExchangeRateQuery) -> NaiveDate {
    match query.kind {
        QueryKind::Latest => chrono::Utc::now().date_naive(),
        QueryKind::Historical(date) => date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency_pair() {
        let pair: CurrencyPair = "eur/usd".parse().unwrap();
        assert_eq!(pair.base, "EUR");
        assert_eq!(pair.quote, "USD");
        assert_eq!(pair.to_string(), "EUR/USD");

        let pair: CurrencyPair = "BTC / USDT".parse().unwrap();
        assert_eq!(pair, CurrencyPair::new("BTC", "USDT"));
    }

    #[test]
    fn test_parse_invalid_currency_pair() {
        for input in ["EURUSD", "EU/USD", "EUR/", "E$R/USD"] {
            let result = input.parse::<CurrencyPair>();
            assert!(result.is_err(), "{input} should not parse");
        }
    }

    #[test]
    fn test_query_display() {
        let pair = CurrencyPair::new("EUR", "USD");
        let date = NaiveDate::from_ymd_opt(2016, 8, 23).unwrap();
        assert_eq!(
            ExchangeRateQuery::latest(pair.clone()).to_string(),
            "EUR/USD (latest)"
        );
        assert_eq!(
            ExchangeRateQuery::historical(pair, date).to_string(),
            "EUR/USD (2016-08-23)"
        );
    }
}
