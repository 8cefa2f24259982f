//! Turns one configured service into a constructed service.

use crate::core::config::{Params, ServiceSpec};
use crate::core::error::BuildError;
use crate::core::service::ExchangeRateService;
use crate::providers::array::ArrayService;
use crate::providers::central_bank_of_czech_republic::CentralBankOfCzechRepublic;
use crate::providers::central_bank_of_republic_turkey::CentralBankOfRepublicTurkey;
use crate::providers::cryptonator::Cryptonator;
use crate::providers::currency_layer::CurrencyLayer;
use crate::providers::european_central_bank::EuropeanCentralBank;
use crate::providers::fixer::Fixer;
use crate::providers::forge::Forge;
use crate::providers::google_finance::GoogleFinance;
use crate::providers::national_bank_of_romania::NationalBankOfRomania;
use crate::providers::open_exchange_rates::OpenExchangeRates;
use crate::providers::registry::{self, ParamDefault, ServiceDescriptor, ServiceKind};
use crate::providers::transport::HttpTransport;
use crate::providers::webservicex::WebserviceX;
use crate::providers::xignite::Xignite;
use crate::providers::yahoo_finance::YahooFinance;
use serde_yaml::Value;
use std::sync::Arc;
use tracing::debug;

/// Parameter lookups for one service, with the errors naming that service.
struct ParamReader<'a> {
    descriptor: &'static ServiceDescriptor,
    params: Option<&'a Params>,
}

impl<'a> ParamReader<'a> {
    fn value(&self, name: &str) -> Option<&'a Value> {
        self.params
            .and_then(|params| params.get(name))
            .filter(|value| !value.is_null())
    }

    fn invalid(&self, name: &str, reason: &str) -> BuildError {
        BuildError::InvalidParameter {
            service: self.descriptor.name.to_string(),
            parameter: name.to_string(),
            reason: reason.to_string(),
        }
    }

    fn required_str(&self, name: &str) -> Result<String, BuildError> {
        match self.value(name) {
            None => Err(BuildError::MissingParameter {
                service: self.descriptor.name.to_string(),
                parameter: name.to_string(),
            }),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(self.invalid(name, "expected a string")),
        }
    }

    fn optional_str(&self, name: &str) -> Result<String, BuildError> {
        match self.value(name) {
            None => Ok(self.descriptor.default_str(name).to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(self.invalid(name, "expected a string")),
        }
    }

    fn optional_bool(&self, name: &str) -> Result<bool, BuildError> {
        match self.value(name) {
            None => match self.descriptor.default_for(name) {
                Some(ParamDefault::Bool(default)) => Ok(default),
                _ => Ok(false),
            },
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(self.invalid(name, "expected a boolean")),
        }
    }
}

/// Builds the service named by `spec`.
///
/// `transport` may be `None` only when no enabled service talks HTTP. No
/// request is sent here.
pub fn create(
    spec: &ServiceSpec,
    transport: Option<&HttpTransport>,
) -> Result<Arc<dyn ExchangeRateService>, BuildError> {
    let descriptor = registry::resolve(&spec.name)?;
    let reader = ParamReader {
        descriptor,
        params: spec.entry.params(),
    };
    debug!(
        service = descriptor.name,
        type_name = %descriptor.type_name(),
        "Creating service"
    );

    // Lazily resolved so `array` builds without a transport.
    let http = || {
        transport
            .cloned()
            .ok_or_else(|| BuildError::UnresolvedDependency {
                kind: "http client",
                name: "default".to_string(),
            })
    };
    let base_url = || reader.optional_str("base_url");

    let service: Arc<dyn ExchangeRateService> = match descriptor.kind {
        ServiceKind::Array => Arc::new(match spec.entry.params() {
            Some(params) => ArrayService::from_params(params)?,
            None => ArrayService::default(),
        }),
        ServiceKind::YahooFinance => Arc::new(YahooFinance::new(&base_url()?, http()?)),
        ServiceKind::Fixer => Arc::new(Fixer::new(
            &base_url()?,
            &reader.required_str("access_key")?,
            reader.optional_bool("enterprise")?,
            http()?,
        )),
        ServiceKind::ExchangeRatesApi => Arc::new(Fixer::exchange_rates_api(
            &base_url()?,
            &reader.required_str("access_key")?,
            reader.optional_bool("enterprise")?,
            http()?,
        )),
        ServiceKind::CurrencyLayer => Arc::new(CurrencyLayer::new(
            &base_url()?,
            &reader.required_str("access_key")?,
            reader.optional_bool("enterprise")?,
            http()?,
        )),
        ServiceKind::OpenExchangeRates => Arc::new(OpenExchangeRates::new(
            &base_url()?,
            &reader.required_str("app_id")?,
            reader.optional_bool("enterprise")?,
            http()?,
        )),
        ServiceKind::Xignite => Arc::new(Xignite::new(
            &base_url()?,
            &reader.required_str("token")?,
            http()?,
        )),
        ServiceKind::Forge => Arc::new(Forge::new(
            &base_url()?,
            &reader.required_str("api_key")?,
            http()?,
        )),
        ServiceKind::WebserviceX => Arc::new(WebserviceX::new(&base_url()?, http()?)),
        ServiceKind::Cryptonator => Arc::new(Cryptonator::new(&base_url()?, http()?)),
        ServiceKind::GoogleFinance => Arc::new(GoogleFinance::new(&base_url()?, http()?)),
        ServiceKind::EuropeanCentralBank => {
            Arc::new(EuropeanCentralBank::new(&base_url()?, http()?))
        }
        ServiceKind::NationalBankOfRomania => {
            Arc::new(NationalBankOfRomania::new(&base_url()?, http()?))
        }
        ServiceKind::CentralBankOfRepublicTurkey => {
            Arc::new(CentralBankOfRepublicTurkey::new(&base_url()?, http()?))
        }
        ServiceKind::CentralBankOfCzechRepublic => {
            Arc::new(CentralBankOfCzechRepublic::new(&base_url()?, http()?))
        }
    };
    Ok(service)
}
