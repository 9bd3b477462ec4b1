//! Space endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};

use super::{authorize, matches_filter, paginate, resource_not_found, ListQuery, SharedState};
use crate::Space;

/// GET /v3/spaces
pub async fn list_spaces(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers).await {
        return rejection;
    }
    let state = state.read().await;

    let spaces: Vec<&Space> = state
        .spaces
        .iter()
        .filter(|s| matches_filter(query.names.as_deref(), Some(s.name.as_str())))
        .filter(|s| {
            matches_filter(query.organization_guids.as_deref(), s.organization_guid())
        })
        .collect();

    Json(paginate(&state.base_url, "/v3/spaces", &spaces, &query)).into_response()
}

/// GET /v3/spaces/{guid}
pub async fn get_space(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(guid): Path<String>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers).await {
        return rejection;
    }
    let state = state.read().await;

    match state.get_space(&guid) {
        Some(space) => Json(space.clone()).into_response(),
        None => resource_not_found("Space"),
    }
}
