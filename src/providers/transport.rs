//! Shared HTTP transport handed to every network-backed service.

use crate::core::error::RateError;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, Request, Response, Url};
use std::sync::Arc;
use tracing::debug;

pub const USER_AGENT: &str = concat!("rateswap/", env!("CARGO_PKG_VERSION"));

/// Builds the requests services send. Swapping the factory lets a host add
/// headers or rewrite URLs without touching any service.
pub trait RequestFactory: Send + Sync {
    fn create_request(&self, method: Method, url: Url) -> Request;
}

#[derive(Debug, Default, Clone)]
pub struct DefaultRequestFactory;

impl RequestFactory for DefaultRequestFactory {
    fn create_request(&self, method: Method, url: Url) -> Request {
        let mut request = Request::new(method, url);
        request
            .headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        request
    }
}

pub fn default_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().user_agent(USER_AGENT).build()
}

/// Joins `path` onto `base_url` and appends `params` as percent-encoded
/// query pairs.
pub fn endpoint(
    service: &str,
    base_url: &str,
    path: &str,
    params: &[(&str, &str)],
) -> Result<Url, RateError> {
    let raw = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&raw)
        .map_err(|e| RateError::invalid_response(service, format!("bad url {raw}: {e}")))?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    requests: Arc<dyn RequestFactory>,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, requests: Arc<dyn RequestFactory>) -> Self {
        Self { client, requests }
    }

    /// Sends a GET and fails on non-success status codes.
    pub async fn get(&self, service: &str, url: Url) -> Result<Response, RateError> {
        debug!("Requesting {} from {}", service, url);

        let request = self.requests.create_request(Method::GET, url);
        let response = self.client.execute(request).await?;
        debug!(status = %response.status(), "Received {} response", service);

        if !response.status().is_success() {
            return Err(RateError::provider(
                service,
                format!("HTTP error: {}", response.status()),
            ));
        }
        Ok(response)
    }

    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        service: &str,
        url: Url,
    ) -> Result<T, RateError> {
        let text = self.get(service, url).await?.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            RateError::invalid_response(service, format!("failed to parse JSON response: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct KeyedRequestFactory;

    impl RequestFactory for KeyedRequestFactory {
        fn create_request(&self, method: Method, url: Url) -> Request {
            let mut request = DefaultRequestFactory.create_request(method, url);
            request
                .headers_mut()
                .insert("x-api-key", HeaderValue::from_static("secret"));
            request
        }
    }

    #[tokio::test]
    async fn test_request_factory_shapes_requests() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates"))
            .and(header("x-api-key", "secret"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok": true}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(default_client().unwrap(), Arc::new(KeyedRequestFactory));
        let body: serde_json::Value = transport
            .get_json("test", endpoint("test", &mock_server.uri(), "rates", &[]).unwrap())
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(default_client().unwrap(), Arc::new(DefaultRequestFactory));
        let result = transport
            .get("test", Url::parse(&mock_server.uri()).unwrap())
            .await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "test returned an error: HTTP error: 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_invalid_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new(default_client().unwrap(), Arc::new(DefaultRequestFactory));
        let result: Result<serde_json::Value, _> =
            transport.get_json("test", Url::parse(&mock_server.uri()).unwrap()).await;
        assert!(matches!(result, Err(RateError::InvalidResponse { .. })));
    }

    #[test]
    fn test_endpoint_encodes_query_values() {
        let url = endpoint(
            "test",
            "http://rates.test/api/",
            "/latest",
            &[("access_key", "ab&symbols=GBP#"), ("symbols", "USD")],
        )
        .unwrap();
        assert_eq!(url.path(), "/api/latest");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [
                ("access_key".to_string(), "ab&symbols=GBP#".to_string()),
                ("symbols".to_string(), "USD".to_string()),
            ]
        );

        let bare = endpoint("test", "http://rates.test", "ticker/eur-usd", &[]).unwrap();
        assert_eq!(bare.as_str(), "http://rates.test/ticker/eur-usd");

        assert!(endpoint("test", "not a url", "latest", &[]).is_err());
    }
}
