//! Application state

use groupcast_core::GroupDispatcher;
use std::sync::Arc;

/// Prometheus handle used to render `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<GroupDispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<GroupDispatcher>) -> Self {
        Self { dispatcher }
    }
}
