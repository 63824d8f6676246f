//! Endpoint client
//!
//! One `EndpointClient` is shared by every fan-out task. Each call is a
//! single GET whose deadline covers connect, send and the full body read.

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::Client;
use reqwest::header::HeaderMap;
use tracing::{debug, info};
use url::Url;

use crate::error::ProxyError;

/// Deadline used when neither the call nor the client config specify one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Endpoint client configuration
#[derive(Clone, Debug)]
pub struct EndpointClientConfig {
    /// Deadline applied when a call passes a zero timeout
    pub default_timeout: Duration,
    /// Skip TLS certificate verification
    pub skip_tls_verify: bool,
}

impl Default for EndpointClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            skip_tls_verify: false,
        }
    }
}

/// HTTP client for backend query endpoints
#[derive(Clone)]
pub struct EndpointClient {
    config: EndpointClientConfig,
    client: Client,
}

impl std::fmt::Debug for EndpointClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EndpointClient {
    /// Create a new endpoint client
    pub fn new(config: EndpointClientConfig) -> Result<Self, ProxyError> {
        let mut builder = Client::builder();

        if config.skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(ProxyError::Client)?;

        info!(
            "Created endpoint client (default timeout {:?})",
            config.default_timeout
        );

        Ok(Self { config, client })
    }

    /// The deadline used for calls that pass a zero timeout
    pub fn default_timeout(&self) -> Duration {
        if self.config.default_timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.config.default_timeout
        }
    }

    fn resolve_timeout(&self, timeout: Duration) -> Duration {
        if timeout.is_zero() {
            self.default_timeout()
        } else {
            timeout
        }
    }

    /// GET `base_url` joined with `path`, returning the raw body.
    ///
    /// Any HTTP status with a readable body is a success. The headers are
    /// sent as given and nothing is retried.
    pub async fn get(
        &self,
        base_url: &str,
        path: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<Bytes, ProxyError> {
        let target = join_url(base_url, path);
        let url = parse_target(&target)?;
        let timeout = self.resolve_timeout(timeout);
        let started = Instant::now();

        let fetch = async {
            let response = self
                .client
                .get(url)
                .headers(headers.clone())
                .send()
                .await
                .map_err(ProxyError::Unreachable)?;
            let status = response.status();
            let body = response.bytes().await.map_err(ProxyError::ReadBody)?;
            Ok::<_, ProxyError>((status, body))
        };

        let (status, body) = tokio::time::timeout(timeout, fetch)
            .await
            .map_err(|_| ProxyError::Timeout(timeout))??;

        debug!(
            target_url = %target,
            status = status.as_u16(),
            bytes = body.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Endpoint responded"
        );

        Ok(body)
    }
}

/// Join a base address and a relative path with exactly one `/`
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn parse_target(target: &str) -> Result<Url, ProxyError> {
    let url = Url::parse(target).map_err(|e| ProxyError::InvalidUrl {
        url: target.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ProxyError::InvalidUrl {
            url: target.to_string(),
            reason: format!("unsupported scheme '{}'", scheme),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use reqwest::header::HeaderValue;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(default_timeout: Duration) -> EndpointClient {
        EndpointClient::new(EndpointClientConfig {
            default_timeout,
            skip_tls_verify: false,
        })
        .unwrap()
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://a", "/health"), "http://a/health");
        assert_eq!(join_url("http://a/", "/health"), "http://a/health");
        assert_eq!(join_url("http://a", "api/v1/query"), "http://a/api/v1/query");
        assert_eq!(join_url("http://a//", "//x"), "http://a/x");
        assert_eq!(join_url("http://a", ""), "http://a/");
    }

    #[tokio::test]
    async fn test_returns_body_and_forwards_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/query"))
            .and(header("x-group", "g1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("payload"))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-group", HeaderValue::from_static("g1"));

        let body = test_client(DEFAULT_TIMEOUT)
            .get(&server.uri(), "/api/v1/query", &headers, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(&body[..], b"payload");
    }

    #[tokio::test]
    async fn test_error_status_is_still_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let body = test_client(DEFAULT_TIMEOUT)
            .get(&server.uri(), "broken", &HeaderMap::new(), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(&body[..], b"unavailable");
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = test_client(DEFAULT_TIMEOUT)
            .get(&server.uri(), "/slow", &HeaderMap::new(), Duration::from_millis(100))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Timeout);
    }

    #[tokio::test]
    async fn test_zero_timeout_uses_client_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = test_client(Duration::from_millis(100));
        let err = client
            .get(&server.uri(), "/slow", &HeaderMap::new(), Duration::ZERO)
            .await
            .unwrap_err();

        match err {
            ProxyError::Timeout(d) => assert_eq!(d, Duration::from_millis(100)),
            other => panic!("expected timeout, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = test_client(DEFAULT_TIMEOUT)
            .get(
                &format!("http://{}", addr),
                "/health",
                &HeaderMap::new(),
                Duration::from_secs(1),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::Unreachable);
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let client = test_client(DEFAULT_TIMEOUT);

        let err = client
            .get("not a url", "/health", &HeaderMap::new(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidUrl);

        let err = client
            .get("ftp://example.com", "/health", &HeaderMap::new(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidUrl);
    }
}
