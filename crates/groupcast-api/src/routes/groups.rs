//! Group health and listing routes

use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use groupcast_core::{HealthMap, HealthStatus, forwarded_headers};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters selecting a group
#[derive(Deserialize)]
pub struct GroupQuery {
    group: Option<String>,
}

/// Health of every endpoint in a group
#[derive(Serialize)]
pub struct GroupHealthResponse {
    pub group: String,
    pub checked_at: DateTime<Utc>,
    pub healthy: usize,
    pub total: usize,
    pub endpoints: HealthMap,
}

/// Browser view of [`GroupHealthResponse`]
#[derive(Template)]
#[template(path = "group_health.html")]
struct GroupHealthPage<'a> {
    group: &'a str,
    checked_at: String,
    healthy: usize,
    total: usize,
    rows: Vec<EndpointRow<'a>>,
}

struct EndpointRow<'a> {
    endpoint: &'a str,
    status: &'static str,
}

impl GroupHealthResponse {
    fn render_html(&self) -> Html<String> {
        let page = GroupHealthPage {
            group: &self.group,
            checked_at: self.checked_at.to_rfc3339(),
            healthy: self.healthy,
            total: self.total,
            rows: self
                .endpoints
                .iter()
                .map(|(endpoint, status)| EndpointRow {
                    endpoint,
                    status: match status {
                        HealthStatus::Healthy => "Healthy",
                        HealthStatus::Unhealthy => "Unhealthy",
                    },
                })
                .collect(),
        };
        Html(
            page.render()
                .unwrap_or_else(|e| format!("<pre>Template error: {e}</pre>")),
        )
    }
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"))
}

#[derive(Serialize)]
pub struct GroupListResponse {
    pub groups: Vec<String>,
}

/// GET /?group=<name>
///
/// JSON by default; an HTML page when the client accepts `text/html`.
async fn group_health(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
    request_headers: HeaderMap,
) -> Result<Response, ApiError> {
    let group = query
        .group
        .filter(|g| !g.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing 'group' query parameter".to_string()))?;
    let headers = forwarded_headers(&group)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid group name: {:?}", group)))?;

    debug!("Group health: {}", group);

    let endpoints = state.dispatcher.health(&group, &headers).await?;
    let healthy = endpoints.values().filter(|s| s.is_healthy()).count();

    let response = GroupHealthResponse {
        group,
        checked_at: Utc::now(),
        healthy,
        total: endpoints.len(),
        endpoints,
    };

    if wants_html(&request_headers) {
        Ok(response.render_html().into_response())
    } else {
        Ok(Json(response).into_response())
    }
}

/// GET /groups
async fn list_groups(State(state): State<AppState>) -> Json<GroupListResponse> {
    Json(GroupListResponse {
        groups: state.dispatcher.groups(),
    })
}

/// Create group routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(group_health))
        .route("/groups", get(list_groups))
}
