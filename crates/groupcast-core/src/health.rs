//! Health probing
//!
//! Every endpoint of a group is probed once on the configured health path.
//! Any answer counts as healthy; any failure, timeouts included, as unhealthy.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use groupcast_proxy::EndpointClient;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reachability of one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Endpoint address to status, one entry per endpoint
pub type HealthMap = BTreeMap<String, HealthStatus>;

/// Probe `health_path` on every endpoint concurrently
pub async fn probe_health(
    client: &Arc<EndpointClient>,
    endpoints: &[String],
    health_path: &str,
    headers: &HeaderMap,
    timeout: Duration,
) -> HealthMap {
    let probes = endpoints.iter().map(|endpoint| async move {
        let status = match client.get(endpoint, health_path, headers, timeout).await {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => {
                debug!(endpoint = %endpoint, "Health probe failed: {}", e);
                HealthStatus::Unhealthy
            }
        };

        let label = if status.is_healthy() { "healthy" } else { "unhealthy" };
        metrics::counter!("groupcast_health_probes_total", "status" => label).increment(1);

        (endpoint.clone(), status)
    });

    join_all(probes).await.into_iter().collect()
}
