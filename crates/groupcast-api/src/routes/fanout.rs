//! Fan-out query routes

use axum::{
    Router,
    extract::{Path, RawQuery, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use groupcast_core::forwarded_headers;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::error::ApiError;
use crate::state::AppState;

/// Number of endpoints a fan-out was sent to
pub const ENDPOINTS_HEADER: &str = "x-groupcast-endpoints";
/// Number of those endpoints that contributed nothing
pub const FAILED_HEADER: &str = "x-groupcast-failed";

/// Pull the `group` parameter out of a raw query string.
///
/// Returns the group name and the remaining parameters re-encoded, if any.
pub fn split_group_param(query: Option<&str>) -> Result<(String, Option<String>), ApiError> {
    let mut group = None;
    let mut rest = form_urlencoded::Serializer::new(String::new());
    let mut has_rest = false;

    for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        if key == "group" {
            if group.is_none() && !value.is_empty() {
                group = Some(value.into_owned());
            }
        } else {
            rest.append_pair(&key, &value);
            has_rest = true;
        }
    }

    let group = group
        .ok_or_else(|| ApiError::BadRequest("Missing 'group' query parameter".to_string()))?;
    let rest = has_rest.then(|| rest.finish());

    Ok((group, rest))
}

/// GET /api/{*path}?group=<name>
async fn fanout_query(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    fan_out(&state, path, query).await
}

/// GET /api/?group=<name>, sent to each endpoint's root
async fn fanout_root(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    fan_out(&state, String::new(), query).await
}

async fn fan_out(
    state: &AppState,
    path: String,
    query: Option<String>,
) -> Result<Response, ApiError> {
    let (group, forwarded_query) = split_group_param(query.as_deref())?;
    let headers = forwarded_headers(&group)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid group name: {:?}", group)))?;

    let relative = match forwarded_query {
        Some(q) => format!("{}?{}", path, q),
        None => path,
    };

    debug!("Fan-out {} to group {}", relative, group);

    let result = state
        .dispatcher
        .dispatch_detailed(&group, &relative, &headers)
        .await?;

    let total = result.outcomes.len();
    let failed = total - result.succeeded();
    if result.all_failed() {
        warn!("Every endpoint of group {} failed for {}", group, relative);
    }

    let mut response = (StatusCode::OK, result.body).into_response();
    let resp_headers = response.headers_mut();
    resp_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    resp_headers.insert(ENDPOINTS_HEADER, HeaderValue::from(total));
    resp_headers.insert(FAILED_HEADER, HeaderValue::from(failed));

    Ok(response)
}

/// Create fan-out routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/", get(fanout_root))
        .route("/api/{*path}", get(fanout_query))
}
