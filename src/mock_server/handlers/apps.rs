//! App endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::{header::LOCATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{authorize, matches_filter, paginate, resource_not_found, ListQuery, SharedState};
use crate::{App, Metadata};

/// Body of `PATCH /v3/apps/:guid`.
#[derive(Debug, Deserialize)]
pub struct UpdateAppParams {
    pub name: Option<String>,
    pub metadata: Option<Metadata>,
}

/// GET /v3/apps
pub async fn list_apps(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers).await {
        return rejection;
    }
    let state = state.read().await;

    let apps: Vec<&App> = state
        .apps
        .iter()
        .filter(|a| matches_filter(query.names.as_deref(), Some(a.name.as_str())))
        .filter(|a| matches_filter(query.space_guids.as_deref(), a.space_guid()))
        .collect();

    Json(paginate(&state.base_url, "/v3/apps", &apps, &query)).into_response()
}

/// GET /v3/apps/{guid}
pub async fn get_app(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(guid): Path<String>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers).await {
        return rejection;
    }
    let state = state.read().await;

    match state.get_app(&guid) {
        Some(app) => (StatusCode::OK, Json(app.clone())).into_response(),
        None => resource_not_found("App"),
    }
}

/// PATCH /v3/apps/{guid}
pub async fn update_app(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(guid): Path<String>,
    Json(params): Json<UpdateAppParams>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers).await {
        return rejection;
    }
    let mut state = state.write().await;

    match state.update_app(&guid, params.name, params.metadata).cloned() {
        Some(app) => (StatusCode::OK, Json(app)).into_response(),
        None => resource_not_found("App"),
    }
}

/// DELETE /v3/apps/{guid}
///
/// Responds 202 with the job in `Location`.
pub async fn delete_app(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(guid): Path<String>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers).await {
        return rejection;
    }
    let mut state = state.write().await;

    match state.delete_app(&guid) {
        Some(job_guid) => {
            let location = format!("{}/v3/jobs/{}", state.base_url, job_guid);
            (StatusCode::ACCEPTED, [(LOCATION, location)]).into_response()
        }
        None => resource_not_found("App"),
    }
}
