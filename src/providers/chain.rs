use crate::core::error::RateError;
use crate::core::rate::{ExchangeRate, ExchangeRateQuery};
use crate::core::service::ExchangeRateService;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered fallback over several services.
///
/// Services are tried in the order given. One that does not support the
/// query is skipped; one that fails has its error kept and the next one is
/// tried. The first successful answer wins.
#[derive(Clone, Default)]
pub struct Chain {
    services: Vec<Arc<dyn ExchangeRateService>>,
}

impl Chain {
    pub fn new(services: Vec<Arc<dyn ExchangeRateService>>) -> Self {
        Chain { services }
    }

    pub fn names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[async_trait]
impl ExchangeRateService for Chain {
    fn name(&self) -> &str {
        "chain"
    }

    fn supports(&self, query: &ExchangeRateQuery) -> bool {
        self.services.iter().any(|s| s.supports(query))
    }

    async fn get_exchange_rate(
        &self,
        query: &ExchangeRateQuery,
    ) -> Result<ExchangeRate, RateError> {
        let mut errors = Vec::new();

        for service in &self.services {
            if !service.supports(query) {
                debug!("{} does not support {}", service.name(), query);
                continue;
            }
            match service.get_exchange_rate(query).await {
                Ok(rate) => return Ok(rate),
                Err(e) => {
                    warn!("{} failed for {}: {}", service.name(), query, e);
                    errors.push(e);
                }
            }
        }

        if errors.is_empty() {
            Err(RateError::UnsupportedQuery {
                query: query.to_string(),
            })
        } else {
            Err(RateError::Chain(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rate::CurrencyPair;
    use std::sync::Mutex;

    struct Recording {
        name: &'static str,
        supports: bool,
        outcome: Option<f64>,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl ExchangeRateService for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn supports(&self, _query: &ExchangeRateQuery) -> bool {
            self.supports
        }

        async fn get_exchange_rate(
            &self,
            query: &ExchangeRateQuery,
        ) -> Result<ExchangeRate, RateError> {
            self.calls.lock().unwrap().push(self.name);
            match self.outcome {
                Some(value) => Ok(ExchangeRate::new(
                    query.pair.clone(),
                    value,
                    chrono::Utc::now().date_naive(),
                    self.name,
                )),
                None => Err(RateError::provider(self.name, "boom")),
            }
        }
    }

    fn service(
        name: &'static str,
        supports: bool,
        outcome: Option<f64>,
        calls: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn ExchangeRateService> {
        Arc::new(Recording {
            name,
            supports,
            outcome,
            calls: Arc::clone(calls),
        })
    }

    fn query() -> ExchangeRateQuery {
        ExchangeRateQuery::latest(CurrencyPair::new("EUR", "USD"))
    }

    #[tokio::test]
    async fn test_first_answer_wins_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new(vec![
            service("a", false, Some(1.0), &calls),
            service("b", true, None, &calls),
            service("c", true, Some(3.0), &calls),
            service("d", true, Some(4.0), &calls),
        ]);

        let rate = chain.get_exchange_rate(&query()).await.unwrap();
        assert_eq!(rate.value, 3.0);
        assert_eq!(rate.provider, "c");
        assert_eq!(*calls.lock().unwrap(), vec!["b", "c"]);
        assert_eq!(chain.names(), ["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_empty_chain_reports_unsupported() {
        let chain = Chain::default();
        assert!(chain.is_empty());
        assert!(!chain.supports(&query()));

        let err = chain.get_exchange_rate(&query()).await.unwrap_err();
        assert!(matches!(err, RateError::UnsupportedQuery { .. }));
    }

    #[tokio::test]
    async fn test_all_failures_are_collected() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new(vec![
            service("a", true, None, &calls),
            service("b", false, None, &calls),
            service("c", true, None, &calls),
        ]);

        match chain.get_exchange_rate(&query()).await {
            Err(RateError::Chain(errors)) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].to_string(), "a returned an error: boom");
                assert_eq!(errors[1].to_string(), "c returned an error: boom");
            }
            other => panic!("expected a chain error, got {other:?}"),
        }
    }
}
