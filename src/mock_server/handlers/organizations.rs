//! Organization endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};

use super::{authorize, matches_filter, paginate, resource_not_found, ListQuery, SharedState};
use crate::Organization;

/// GET /v3/organizations
pub async fn list_organizations(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers).await {
        return rejection;
    }
    let state = state.read().await;

    let orgs: Vec<&Organization> = state
        .organizations
        .iter()
        .filter(|o| matches_filter(query.names.as_deref(), Some(o.name.as_str())))
        .collect();

    Json(paginate(&state.base_url, "/v3/organizations", &orgs, &query)).into_response()
}

/// GET /v3/organizations/{guid}
pub async fn get_organization(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(guid): Path<String>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers).await {
        return rejection;
    }
    let state = state.read().await;

    match state.get_organization(&guid) {
        Some(org) => Json(org.clone()).into_response(),
        None => resource_not_found("Organization"),
    }
}
