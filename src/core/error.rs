//! Error types shared by the builder and the query path.

use thiserror::Error;

/// Failures raised while turning configuration into a [`crate::swap::Swap`].
///
/// All of these are configuration mistakes: none is retried and no partial
/// chain is ever returned alongside one.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Unknown service with name \"{name}\".")]
    UnknownService { name: String },

    #[error("Missing parameter \"{parameter}\" for service \"{service}\".")]
    MissingParameter { service: String, parameter: String },

    #[error("Invalid parameter \"{parameter}\" for service \"{service}\": {reason}")]
    InvalidParameter {
        service: String,
        parameter: String,
        reason: String,
    },

    #[error("Invalid cache configuration \"{name}\": {reason}.")]
    InvalidCacheConfiguration { name: String, reason: String },

    #[error("No {kind} registered with name \"{name}\".")]
    UnresolvedDependency { kind: &'static str, name: String },

    #[error("Failed to build default HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Failures raised while answering a rate query.
#[derive(Error, Debug)]
pub enum RateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response from {service}: {reason}")]
    InvalidResponse { service: String, reason: String },

    #[error("{service} returned an error: {message}")]
    Provider { service: String, message: String },

    #[error("No service supports the query {query}")]
    UnsupportedQuery { query: String },

    #[error("All services failed: {}", format_chain(.0))]
    Chain(Vec<RateError>),
}

impl RateError {
    pub(crate) fn invalid_response(service: &str, reason: impl Into<String>) -> Self {
        RateError::InvalidResponse {
            service: service.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn provider(service: &str, message: impl Into<String>) -> Self {
        RateError::Provider {
            service: service.to_string(),
            message: message.into(),
        }
    }
}

fn format_chain(errors: &[RateError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
