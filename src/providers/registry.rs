//! Compiled-in table of the services a configuration may name.

use crate::core::error::BuildError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Array,
    YahooFinance,
    Fixer,
    ExchangeRatesApi,
    CurrencyLayer,
    OpenExchangeRates,
    Xignite,
    Forge,
    WebserviceX,
    Cryptonator,
    GoogleFinance,
    EuropeanCentralBank,
    NationalBankOfRomania,
    CentralBankOfRepublicTurkey,
    CentralBankOfCzechRepublic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    Bool(bool),
    Str(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionalParam {
    pub name: &'static str,
    pub default: ParamDefault,
}

/// How to build one service: what it needs and what it may be given.
#[derive(Debug, PartialEq)]
pub struct ServiceDescriptor {
    pub name: &'static str,
    pub kind: ServiceKind,
    pub required: &'static [&'static str],
    pub optional: &'static [OptionalParam],
    pub needs_http: bool,
}

impl ServiceDescriptor {
    /// Name of the service type this entry builds.
    pub fn type_name(&self) -> String {
        type_name(self.name)
    }

    pub fn default_for(&self, param: &str) -> Option<ParamDefault> {
        self.optional
            .iter()
            .find(|p| p.name == param)
            .map(|p| p.default)
    }

    pub fn default_str(&self, param: &str) -> &'static str {
        match self.default_for(param) {
            Some(ParamDefault::Str(value)) => value,
            _ => "",
        }
    }
}

const fn base_url(url: &'static str) -> OptionalParam {
    OptionalParam {
        name: "base_url",
        default: ParamDefault::Str(url),
    }
}

const ENTERPRISE: OptionalParam = OptionalParam {
    name: "enterprise",
    default: ParamDefault::Bool(false),
};

pub static SERVICES: &[ServiceDescriptor] = &[
    ServiceDescriptor {
        name: "array",
        kind: ServiceKind::Array,
        required: &[],
        optional: &[],
        needs_http: false,
    },
    ServiceDescriptor {
        name: "yahoo_finance",
        kind: ServiceKind::YahooFinance,
        required: &[],
        optional: &[base_url("https://query1.finance.yahoo.com")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "fixer",
        kind: ServiceKind::Fixer,
        required: &["access_key"],
        optional: &[ENTERPRISE, base_url("https://data.fixer.io/api")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "exchange_rates_api",
        kind: ServiceKind::ExchangeRatesApi,
        required: &["access_key"],
        optional: &[ENTERPRISE, base_url("https://api.exchangeratesapi.io/v1")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "currency_layer",
        kind: ServiceKind::CurrencyLayer,
        required: &["access_key"],
        optional: &[ENTERPRISE, base_url("https://apilayer.net/api")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "open_exchange_rates",
        kind: ServiceKind::OpenExchangeRates,
        required: &["app_id"],
        optional: &[ENTERPRISE, base_url("https://openexchangerates.org/api")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "xignite",
        kind: ServiceKind::Xignite,
        required: &["token"],
        optional: &[base_url("https://globalcurrencies.xignite.com")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "forge",
        kind: ServiceKind::Forge,
        required: &["api_key"],
        optional: &[base_url("https://forex.1forge.com/1.0.3")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "webservicex",
        kind: ServiceKind::WebserviceX,
        required: &[],
        optional: &[base_url("http://www.webservicex.net")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "cryptonator",
        kind: ServiceKind::Cryptonator,
        required: &[],
        optional: &[base_url("https://api.cryptonator.com/api")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "google_finance",
        kind: ServiceKind::GoogleFinance,
        required: &[],
        optional: &[base_url("https://www.google.com/finance")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "european_central_bank",
        kind: ServiceKind::EuropeanCentralBank,
        required: &[],
        optional: &[base_url("https://www.ecb.europa.eu/stats/eurofxref")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "national_bank_of_romania",
        kind: ServiceKind::NationalBankOfRomania,
        required: &[],
        optional: &[base_url("https://www.bnr.ro")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "central_bank_of_republic_turkey",
        kind: ServiceKind::CentralBankOfRepublicTurkey,
        required: &[],
        optional: &[base_url("https://www.tcmb.gov.tr/kurlar")],
        needs_http: true,
    },
    ServiceDescriptor {
        name: "central_bank_of_czech_republic",
        kind: ServiceKind::CentralBankOfCzechRepublic,
        required: &[],
        optional: &[base_url(
            "https://www.cnb.cz/cs/financni_trh/devizovy_trh/kurzy_devizoveho_trhu",
        )],
        needs_http: true,
    },
];

/// Names whose type name does not follow snake_case -> CamelCase.
const TYPE_NAME_OVERRIDES: &[(&str, &str)] = &[("array", "PhpArray"), ("webservicex", "WebserviceX")];

pub fn resolve(name: &str) -> Result<&'static ServiceDescriptor, BuildError> {
    SERVICES
        .iter()
        .find(|descriptor| descriptor.name == name)
        .ok_or_else(|| BuildError::UnknownService {
            name: name.to_string(),
        })
}

pub fn type_name(name: &str) -> String {
    if let Some((_, type_name)) = TYPE_NAME_OVERRIDES.iter().find(|(n, _)| *n == name) {
        return type_name.to_string();
    }
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_service() {
        let descriptor = resolve("open_exchange_rates").unwrap();
        assert_eq!(descriptor.kind, ServiceKind::OpenExchangeRates);
        assert_eq!(descriptor.required, &["app_id"]);
        assert_eq!(
            descriptor.default_for("enterprise"),
            Some(ParamDefault::Bool(false))
        );
        assert!(descriptor.needs_http);
    }

    #[test]
    fn test_resolve_unknown_service() {
        let err = resolve("bankster").unwrap_err();
        assert!(matches!(err, BuildError::UnknownService { ref name } if name == "bankster"));
    }

    #[test]
    fn test_array_needs_no_transport() {
        assert!(!resolve("array").unwrap().needs_http);
    }

    #[test]
    fn test_central_banks_need_no_parameters() {
        for name in [
            "google_finance",
            "european_central_bank",
            "national_bank_of_romania",
            "central_bank_of_republic_turkey",
            "central_bank_of_czech_republic",
        ] {
            let descriptor = resolve(name).unwrap();
            assert!(descriptor.required.is_empty(), "{name}");
            assert!(descriptor.needs_http, "{name}");
            assert!(descriptor.default_str("base_url").starts_with("https://"));
        }
        assert_eq!(
            resolve("central_bank_of_czech_republic").unwrap().kind,
            ServiceKind::CentralBankOfCzechRepublic
        );
    }

    #[test]
    fn test_type_names() {
        assert_eq!(type_name("european_central_bank"), "EuropeanCentralBank");
        assert_eq!(type_name("currency_layer"), "CurrencyLayer");
        assert_eq!(type_name("webservicex"), "WebserviceX");
        assert_eq!(type_name("array"), "PhpArray");
        assert_eq!(
            type_name("central_bank_of_republic_turkey"),
            "CentralBankOfRepublicTurkey"
        );
        assert_eq!(resolve("fixer").unwrap().type_name(), "Fixer");
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in SERVICES.iter().enumerate() {
            for b in &SERVICES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
