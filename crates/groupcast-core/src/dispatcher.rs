//! Group dispatcher
//!
//! Resolves a group name through the registry and hands its endpoint
//! snapshot to the aggregator or the prober. Holds no per-request state.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use groupcast_proxy::EndpointClient;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, info};

use crate::config::{DispatchConfig, GROUP_HEADER};
use crate::error::CoreError;
use crate::fanout::{FanoutResult, fanout_detailed};
use crate::health::{HealthMap, probe_health};
use crate::registry::{EndpointList, GroupRegistry};

/// Build the header set forwarded to every endpoint of `group`
///
/// Returns `None` when the group name cannot be carried in a header value.
pub fn forwarded_headers(group: &str) -> Option<HeaderMap> {
    let value = HeaderValue::from_str(group).ok()?;
    let mut headers = HeaderMap::new();
    headers.insert(GROUP_HEADER, value);
    Some(headers)
}

/// Routes group-level requests to their endpoints
pub struct GroupDispatcher {
    registry: Arc<dyn GroupRegistry>,
    client: Arc<EndpointClient>,
    config: DispatchConfig,
}

impl GroupDispatcher {
    pub fn new(
        registry: Arc<dyn GroupRegistry>,
        client: Arc<EndpointClient>,
        config: DispatchConfig,
    ) -> Self {
        info!(
            "Group dispatcher ready (timeout {:?}, health path {})",
            config.timeout(),
            config.health_path
        );
        Self {
            registry,
            client,
            config,
        }
    }

    fn resolve(&self, group: &str) -> Result<EndpointList, CoreError> {
        self.registry
            .lookup(group)
            .ok_or_else(|| CoreError::GroupNotFound(group.to_string()))
    }

    /// Per-endpoint deadline applied to every call
    pub fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    /// Names of all configured groups
    pub fn groups(&self) -> Vec<String> {
        self.registry.group_names()
    }

    /// Fan `path` out to the group and return the merged body
    pub async fn dispatch(
        &self,
        group: &str,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Bytes, CoreError> {
        Ok(self.dispatch_detailed(group, path, headers).await?.body)
    }

    /// Fan `path` out to the group, keeping every endpoint's outcome
    pub async fn dispatch_detailed(
        &self,
        group: &str,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<FanoutResult, CoreError> {
        let endpoints = self.resolve(group)?;
        debug!(group, path, endpoints = endpoints.len(), "Dispatching fan-out");

        Ok(fanout_detailed(&self.client, &endpoints, path, headers, self.timeout()).await)
    }

    /// Probe the health path of every endpoint in the group
    pub async fn health(&self, group: &str, headers: &HeaderMap) -> Result<HealthMap, CoreError> {
        let endpoints = self.resolve(group)?;
        debug!(group, endpoints = endpoints.len(), "Probing group health");

        Ok(probe_health(
            &self.client,
            &endpoints,
            &self.config.health_path,
            headers,
            self.timeout(),
        )
        .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthStatus;
    use crate::registry::InMemoryRegistry;
    use groupcast_proxy::EndpointClientConfig;
    use std::collections::HashMap;
    use wiremock::matchers::{any, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher(groups: HashMap<String, Vec<String>>, timeout_ms: u64) -> GroupDispatcher {
        let client = Arc::new(EndpointClient::new(EndpointClientConfig::default()).unwrap());
        GroupDispatcher::new(
            Arc::new(InMemoryRegistry::new(groups)),
            client,
            DispatchConfig {
                timeout_ms,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_forwarded_headers() {
        let headers = forwarded_headers("g1").unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-group").unwrap(), "g1");

        assert!(forwarded_headers("bad\nname").is_none());
    }

    #[tokio::test]
    async fn test_unknown_group_performs_no_io() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let groups = HashMap::from([("g1".to_string(), vec![server.uri()])]);
        let dispatcher = dispatcher(groups, 500);
        let headers = forwarded_headers("nope").unwrap();

        let err = dispatcher.dispatch("nope", "/query", &headers).await.unwrap_err();
        assert!(matches!(err, CoreError::GroupNotFound(ref g) if g == "nope"));

        let err = dispatcher.health("nope", &headers).await.unwrap_err();
        assert!(matches!(err, CoreError::GroupNotFound(_)));

        server.verify().await;
    }

    #[tokio::test]
    async fn test_dispatch_and_health() {
        let a = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/query"))
            .and(header("x-group", "g1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("X"))
            .mount(&a)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&a)
            .await;

        let b = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("Y")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&b)
            .await;

        let groups = HashMap::from([("g1".to_string(), vec![a.uri(), b.uri()])]);
        let dispatcher = dispatcher(groups, 300);
        let headers = forwarded_headers("g1").unwrap();

        let body = dispatcher.dispatch("g1", "/api/v1/query", &headers).await.unwrap();
        assert_eq!(&body[..], b"X");

        let health = dispatcher.health("g1", &headers).await.unwrap();
        assert_eq!(health.len(), 2);
        assert_eq!(health[&a.uri()], HealthStatus::Healthy);
        assert_eq!(health[&b.uri()], HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_empty_group() {
        let groups = HashMap::from([("empty".to_string(), vec![])]);
        let dispatcher = dispatcher(groups, 0);
        let headers = forwarded_headers("empty").unwrap();

        let result = dispatcher.dispatch_detailed("empty", "/query", &headers).await.unwrap();
        assert!(result.body.is_empty());
        assert!(result.outcomes.is_empty());
        assert!(dispatcher.health("empty", &headers).await.unwrap().is_empty());
        assert_eq!(dispatcher.timeout(), Duration::from_secs(2));
    }
}
