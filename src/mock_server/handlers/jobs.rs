//! Job endpoint handlers.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};

use super::{authorize, resource_not_found, SharedState};

/// GET /v3/jobs/{guid}
///
/// Every call advances the job's script by one step.
pub async fn get_job(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(guid): Path<String>,
) -> Response {
    if let Err(rejection) = authorize(&state, &headers).await {
        return rejection;
    }
    let mut state = state.write().await;

    match state.poll_job(&guid) {
        Some(job) => Json(job).into_response(),
        None => resource_not_found("Job"),
    }
}
