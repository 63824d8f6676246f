//! Prometheus exposition of the fan-out and health counters

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
    routing::get,
};
use metrics::{Unit, describe_counter, describe_histogram};
use std::sync::Arc;

use crate::state::MetricsHandle;

/// Content type of the Prometheus text format
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Register help text for every metric groupcast records.
///
/// Must run after the recorder is installed; descriptions sent earlier are dropped.
pub fn describe_metrics() {
    describe_counter!(
        "groupcast_fanout_requests_total",
        "Fan-out dispatches to a non-empty endpoint list"
    );
    describe_counter!(
        "groupcast_endpoint_failures_total",
        "Endpoint requests that contributed nothing to a fan-out, by failure kind"
    );
    describe_histogram!(
        "groupcast_fanout_duration_seconds",
        Unit::Seconds,
        "Wall time of a fan-out until its slowest endpoint finished"
    );
    describe_counter!(
        "groupcast_health_probes_total",
        "Endpoint health checks, by resulting status"
    );
    describe_counter!("groupcast_liveness_checks_total", "Requests to /healthz");
}

/// Create metrics routes with the Prometheus handle
pub fn routes(handle: Arc<MetricsHandle>) -> Router {
    describe_metrics();

    Router::new()
        .route("/metrics", get(get_metrics))
        .with_state(handle)
}

/// GET /metrics
async fn get_metrics(State(handle): State<Arc<MetricsHandle>>) -> Response {
    let mut response = handle.render().into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(EXPOSITION_CONTENT_TYPE),
    );
    response
}
