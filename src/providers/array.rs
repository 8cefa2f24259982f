use crate::core::config::Params;
use crate::core::error::{BuildError, RateError};
use crate::core::rate::{CurrencyPair, ExchangeRate, ExchangeRateQuery, QueryKind, query_date};
use crate::core::service::ExchangeRateService;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_yaml::Value;
use std::collections::HashMap;

const NAME: &str = "array";

/// Answers from a literal rate table; needs neither network nor transport.
#[derive(Debug, Default, Clone)]
pub struct ArrayService {
    latest: HashMap<CurrencyPair, f64>,
    historical: HashMap<NaiveDate, HashMap<CurrencyPair, f64>>,
}

fn invalid(parameter: &str, reason: String) -> BuildError {
    BuildError::InvalidParameter {
        service: NAME.to_string(),
        parameter: parameter.to_string(),
        reason,
    }
}

fn key_str(key: &Value) -> Result<String, BuildError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        other => Err(invalid(
            &format!("{other:?}"),
            "keys must be currency pairs or dates".to_string(),
        )),
    }
}

fn parse_rate(key: &str, value: &Value) -> Result<f64, BuildError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| invalid(key, "rate is not a number".to_string())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| invalid(key, format!("rate is not a number: {e}"))),
        _ => Err(invalid(key, "rate is not a number".to_string())),
    }
}

fn parse_table(params: &Params) -> Result<HashMap<CurrencyPair, f64>, BuildError> {
    params
        .iter()
        .map(|(key, value)| {
            let key = key_str(key)?;
            let pair = key
                .parse::<CurrencyPair>()
                .map_err(|e| invalid(&key, e.to_string()))?;
            Ok((pair, parse_rate(&key, value)?))
        })
        .collect()
}

impl ArrayService {
    pub fn new(
        latest: HashMap<CurrencyPair, f64>,
        historical: HashMap<NaiveDate, HashMap<CurrencyPair, f64>>,
    ) -> Self {
        Self { latest, historical }
    }

    /// Reads a table of `"BASE/QUOTE" -> rate` entries (latest rates) mixed
    /// with `"YYYY-MM-DD" -> { "BASE/QUOTE" -> rate }` entries (historical).
    pub fn from_params(params: &Params) -> Result<Self, BuildError> {
        let mut service = ArrayService::default();
        for (key, value) in params {
            let key = key_str(key)?;
            if let Ok(pair) = key.parse::<CurrencyPair>() {
                service.latest.insert(pair, parse_rate(&key, value)?);
                continue;
            }
            let date = NaiveDate::parse_from_str(&key, "%Y-%m-%d")
                .map_err(|_| invalid(&key, "expected a currency pair or a date".to_string()))?;
            let Value::Mapping(table) = value else {
                return Err(invalid(&key, "historical rates must be a mapping".to_string()));
            };
            service.historical.insert(date, parse_table(table)?);
        }
        Ok(service)
    }

    fn lookup(&self, query: &ExchangeRateQuery) -> Option<f64> {
        if query.pair.is_identical() {
            return Some(1.0);
        }
        match query.kind {
            QueryKind::Latest => self.latest.get(&query.pair).copied(),
            QueryKind::Historical(date) => self
                .historical
                .get(&date)
                .and_then(|rates| rates.get(&query.pair))
                .copied(),
        }
    }
}

#[async_trait]
impl ExchangeRateService for ArrayService {
    fn name(&self) -> &str {
        NAME
    }

    fn supports(&self, query: &ExchangeRateQuery) -> bool {
        self.lookup(query).is_some()
    }

    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let value = self.lookup(query).ok_or_else(|| RateError::UnsupportedQuery {
            query: query.to_string(),
        })?;
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

    fn params(yaml: &str) -> Params {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[tokio::test]
    async fn test_latest_rate_from_table() {
        let service = ArrayService::from_params(&params(r#""EUR/USD": 1.5"#)).unwrap();
        let query = ExchangeRateQuery::latest(CurrencyPair::new("EUR", "USD"));

        assert!(service.supports(&query));
        let rate = service.get_exchange_rate(&query).await.unwrap();
        assert_eq!(rate.value, 1.5);
        assert_eq!(rate.provider, "array");
    }

    #[tokio::test]
    async fn test_historical_rate_from_table() {
        let service = ArrayService::from_params(&params(
            r#"
"EUR/USD": 1.1
"2016-08-23":
  "EUR/USD": "1.25"
"#,
        ))
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2016, 8, 23).unwrap();
        let query = ExchangeRateQuery::historical(CurrencyPair::new("EUR", "USD"), date);

        let rate = service.get_exchange_rate(&query).await.unwrap();
        assert_eq!(rate.value, 1.25);
        assert_eq!(rate.date, date);

        let other_day = ExchangeRateQuery::historical(
            CurrencyPair::new("EUR", "USD"),
            NaiveDate::from_ymd_opt(2016, 8, 24).unwrap(),
        );
        assert!(!service.supports(&other_day));
    }

    #[test]
    fn test_unknown_pair_is_declined() {
        let service = ArrayService::from_params(&params(r#""EUR/USD": 1.5"#)).unwrap();
        assert!(!service.supports(&ExchangeRateQuery::latest(CurrencyPair::new("USD", "EUR"))));
        assert!(service.supports(&ExchangeRateQuery::latest(CurrencyPair::new("GBP", "GBP"))));
    }

    #[test]
    fn test_invalid_tables_are_rejected() {
        for yaml in [
            r#""EUR/USD": "abc""#,
            r#""not a pair": 1.0"#,
            r#""2016-08-23": 1.0"#,
            r#""2016-08-23": { "EURUSD": 1.0 }"#,
        ] {
            let result = ArrayService::from_params(&params(yaml));
            assert!(
                matches!(result, Err(BuildError::InvalidParameter { .. })),
                "{yaml} should be rejected"
            );
        }
    }
}
