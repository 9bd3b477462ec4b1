//! Token endpoint and API root handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;

use super::SharedState;
use crate::mock_server::state::TOKEN_LIFETIME_SECS;

/// Form body of `POST /oauth/token`.
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    pub grant_type: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
}

/// POST /oauth/token
///
/// Client authentication is not checked; any client may use any grant.
pub async fn issue_token(
    State(state): State<SharedState>,
    Form(form): Form<TokenForm>,
) -> Response {
    let mut state = state.write().await;

    let grant = match form.grant_type.as_str() {
        "password" => {
            let valid = match (&form.username, &form.password) {
                (Some(username), Some(password)) => state.check_password(username, password),
                _ => false,
            };
            valid.then(|| state.issue_token())
        }
        "client_credentials" => Some(state.issue_token()),
        "refresh_token" => form
            .refresh_token
            .as_deref()
            .and_then(|r| state.redeem_refresh_token(r)),
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "unsupported_grant_type",
                    "error_description": format!("Unsupported grant type: {other}")
                })),
            )
                .into_response()
        }
    };

    match grant {
        Some(grant) => Json(json!({
            "access_token": grant.access_token,
            "token_type": "bearer",
            "refresh_token": grant.refresh_token,
            "expires_in": TOKEN_LIFETIME_SECS,
            "scope": "cloud_controller.read cloud_controller.write",
        }))
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Bad credentials"
            })),
        )
            .into_response(),
    }
}

/// GET /
pub async fn root(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let base = state.read().await.base_url.clone();
    Json(json!({
        "links": {
            "self": {"href": base},
            "cloud_controller_v3": {"href": format!("{base}/v3")},
            "login": {"href": base},
            "uaa": {"href": base},
        }
    }))
}
