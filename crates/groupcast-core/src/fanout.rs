//! Fan-out aggregation
//!
//! Issues the same GET to every endpoint of a group at once, waits for all
//! of them, and concatenates the bodies of the ones that answered.
//!
//! Bodies are appended in the order the tasks finish, not in endpoint-list
//! order, so the byte order across endpoints is not deterministic. The merge
//! is plain concatenation: structured documents only combine cleanly when
//! each backend returns a self-delimited fragment.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use futures::future::join_all;
use groupcast_proxy::{EndpointClient, FailureKind};
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use serde::Serialize;
use tracing::{debug, warn};

/// Result of one endpoint call within a dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EndpointOutcome {
    Success {
        endpoint: String,
        bytes: usize,
    },
    Failure {
        endpoint: String,
        kind: FailureKind,
        message: String,
    },
}

impl EndpointOutcome {
    pub fn endpoint(&self) -> &str {
        match self {
            EndpointOutcome::Success { endpoint, .. }
            | EndpointOutcome::Failure { endpoint, .. } => endpoint,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EndpointOutcome::Success { .. })
    }
}

/// Merged body plus one outcome per endpoint, in endpoint-list order
#[derive(Debug, Clone, Default)]
pub struct FanoutResult {
    pub body: Bytes,
    pub outcomes: Vec<EndpointOutcome>,
}

impl FanoutResult {
    /// Number of endpoints that contributed a body
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Outcomes of the endpoints that failed
    pub fn failed(&self) -> impl Iterator<Item = &EndpointOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// True when there was at least one endpoint and none answered.
    ///
    /// An empty `body` alone cannot tell this apart from every shard
    /// returning an empty response.
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.succeeded() == 0
    }
}

/// Fan out `path` to `endpoints` and return only the merged success bytes
pub async fn fanout(
    client: &Arc<EndpointClient>,
    endpoints: &[String],
    path: &str,
    headers: &HeaderMap,
    timeout: Duration,
) -> Bytes {
    fanout_detailed(client, endpoints, path, headers, timeout)
        .await
        .body
}

/// Fan out `path` to `endpoints`, reporting every endpoint's outcome
pub async fn fanout_detailed(
    client: &Arc<EndpointClient>,
    endpoints: &[String],
    path: &str,
    headers: &HeaderMap,
    timeout: Duration,
) -> FanoutResult {
    if endpoints.is_empty() {
        return FanoutResult::default();
    }

    metrics::counter!("groupcast_fanout_requests_total").increment(1);
    let started = Instant::now();

    let merged = Arc::new(Mutex::new(BytesMut::new()));
    let headers = Arc::new(headers.clone());
    let path: Arc<str> = Arc::from(path);

    let tasks: Vec<_> = endpoints
        .iter()
        .cloned()
        .map(|endpoint| {
            let client = client.clone();
            let merged = merged.clone();
            let headers = headers.clone();
            let path = path.clone();

            tokio::spawn(async move {
                match client.get(&endpoint, &path, &headers, timeout).await {
                    Ok(body) => {
                        let bytes = body.len();
                        merged.lock().extend_from_slice(&body);
                        EndpointOutcome::Success { endpoint, bytes }
                    }
                    Err(e) => {
                        let kind = e.kind();
                        warn!(endpoint = %endpoint, kind = %kind, "Fan-out request failed: {}", e);
                        metrics::counter!(
                            "groupcast_endpoint_failures_total",
                            "kind" => kind.as_str()
                        )
                        .increment(1);
                        EndpointOutcome::Failure {
                            endpoint,
                            kind,
                            message: e.to_string(),
                        }
                    }
                }
            })
        })
        .collect();

    let outcomes: Vec<EndpointOutcome> = join_all(tasks)
        .await
        .into_iter()
        .zip(endpoints)
        .map(|(joined, endpoint)| {
            joined.unwrap_or_else(|e| EndpointOutcome::Failure {
                endpoint: endpoint.clone(),
                kind: FailureKind::Unreachable,
                message: format!("Endpoint task aborted: {}", e),
            })
        })
        .collect();

    // Every task has been joined, so this is normally the last reference.
    let body = match Arc::try_unwrap(merged) {
        Ok(buffer) => buffer.into_inner().freeze(),
        Err(shared) => Bytes::copy_from_slice(&shared.lock()),
    };

    let elapsed = started.elapsed();
    metrics::histogram!("groupcast_fanout_duration_seconds").record(elapsed.as_secs_f64());

    let result = FanoutResult { body, outcomes };
    debug!(
        path = %path,
        endpoints = endpoints.len(),
        succeeded = result.succeeded(),
        bytes = result.body.len(),
        latency_ms = elapsed.as_millis() as u64,
        "Fan-out complete"
    );

    result
}
