pub mod array;
pub mod caching;
pub mod central_bank_of_czech_republic;
pub mod central_bank_of_republic_turkey;
pub mod chain;
pub mod cryptonator;
pub mod currency_layer;
pub mod european_central_bank;
pub mod factory;
pub mod fixer;
pub mod forge;
pub mod google_finance;
pub mod national_bank_of_romania;
pub mod open_exchange_rates;
pub mod registry;
pub mod transport;
pub mod webservicex;
pub mod xignite;
pub mod xml;
pub mod yahoo_finance;

// Re-export the composition types for callers building their own chains
pub use caching::CachingService;
pub use chain::Chain;
pub use transport::{DefaultRequestFactory, HttpTransport, RequestFactory};
