//! API routes

mod fanout;
mod groups;
mod health;
pub mod metrics;

use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::state::{AppState, MetricsHandle};

/// Create the main router
///
/// `docs_dir`, when set, is served as static files under `/docs`.
pub fn create_router(
    state: AppState,
    metrics_handle: Option<Arc<MetricsHandle>>,
    docs_dir: Option<PathBuf>,
) -> Router {
    let mut router = Router::new()
        // Service liveness
        .merge(health::routes())
        // Group health and listing
        .merge(groups::routes())
        // Fan-out queries
        .merge(fanout::routes())
        .with_state(state);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    if let Some(dir) = docs_dir {
        router = router.nest_service("/docs", ServeDir::new(dir));
    }

    router
}
