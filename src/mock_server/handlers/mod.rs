//! HTTP request handlers for the mock server.

pub mod apps;
pub mod auth;
pub mod jobs;
pub mod organizations;
pub mod spaces;

pub use apps::*;
pub use auth::*;
pub use jobs::*;
pub use organizations::*;
pub use spaces::*;

use std::sync::Arc;

use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;

pub type SharedState = Arc<RwLock<MockState>>;

/// Default `per_page` when the request gives none.
const DEFAULT_PER_PAGE: u32 = 50;

/// A `{"errors": [...]}` response with one entry.
pub fn cf_error(status: StatusCode, code: i64, title: &str, detail: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "errors": [{"code": code, "title": title, "detail": detail.into()}]
        })),
    )
        .into_response()
}

pub fn resource_not_found(kind: &str) -> Response {
    cf_error(
        StatusCode::NOT_FOUND,
        crate::CODE_RESOURCE_NOT_FOUND,
        "CF-ResourceNotFound",
        format!("{kind} not found"),
    )
}

/// Reject the request unless it carries a currently valid bearer token.
pub async fn authorize(state: &SharedState, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("bearer ")
                .or_else(|| v.strip_prefix("Bearer "))
        });

    match token {
        Some(token) if state.read().await.is_authorized(token) => Ok(()),
        _ => Err(cf_error(
            StatusCode::UNAUTHORIZED,
            1000,
            "CF-InvalidAuthToken",
            "Invalid Auth Token",
        )),
    }
}

/// Paging and filter parameters shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Comma-separated names.
    pub names: Option<String>,
    pub space_guids: Option<String>,
    pub organization_guids: Option<String>,
}

impl ListQuery {
    fn filters(&self) -> Vec<(&'static str, &str)> {
        [
            ("names", self.names.as_deref()),
            ("space_guids", self.space_guids.as_deref()),
            ("organization_guids", self.organization_guids.as_deref()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
    }
}

/// Whether `value` is in the comma-separated `filter` (or no filter is set).
pub fn matches_filter(filter: Option<&str>, value: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(filter) => value.is_some_and(|v| filter.split(',').any(|f| f == v)),
    }
}

/// Build a collection body with absolute `first`/`last`/`next`/`previous`
/// links, the way the real API does.
pub fn paginate<T: Serialize>(base_url: &str, path: &str, items: &[T], query: &ListQuery) -> Value {
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1) as usize;
    let page = query.page.unwrap_or(1).max(1) as usize;
    let total = items.len();
    let total_pages = total.div_ceil(per_page).max(1);

    let extra: String = query
        .filters()
        .iter()
        .map(|(k, v)| format!("&{}={}", k, urlencoding::encode(v)))
        .collect();
    let link = |n: usize| {
        json!({"href": format!("{base_url}{path}?page={n}&per_page={per_page}{extra}")})
    };

    let resources: Vec<&T> = items
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();
    let next = if page < total_pages { link(page + 1) } else { Value::Null };
    let previous = if page > 1 { link(page - 1) } else { Value::Null };

    json!({
        "pagination": {
            "total_results": total,
            "total_pages": total_pages,
            "first": link(1),
            "last": link(total_pages),
            "next": next,
            "previous": previous,
        },
        "resources": resources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: u32, per_page: u32) -> ListQuery {
        ListQuery {
            page: Some(page),
            per_page: Some(per_page),
            ..Default::default()
        }
    }

    #[test]
    fn test_paginate_middle_page() {
        let items = vec![1, 2, 3, 4, 5];
        let body = paginate("http://h", "/v3/apps", &items, &query(2, 2));

        assert_eq!(body["resources"], json!([3, 4]));
        assert_eq!(body["pagination"]["total_results"], 5);
        assert_eq!(body["pagination"]["total_pages"], 3);
        assert_eq!(
            body["pagination"]["next"]["href"],
            "http://h/v3/apps?page=3&per_page=2"
        );
        assert_eq!(
            body["pagination"]["previous"]["href"],
            "http://h/v3/apps?page=1&per_page=2"
        );
    }

    #[test]
    fn test_paginate_last_page_has_no_next() {
        let items = vec![1, 2, 3];
        let body = paginate("http://h", "/v3/apps", &items, &query(2, 2));
        assert!(body["pagination"]["next"].is_null());
    }

    #[test]
    fn test_paginate_keeps_filters_in_links() {
        let items = vec![1, 2, 3];
        let mut q = query(1, 1);
        q.names = Some("web".to_string());
        let body = paginate("http://h", "/v3/apps", &items, &q);
        assert_eq!(
            body["pagination"]["next"]["href"],
            "http://h/v3/apps?page=2&per_page=1&names=web"
        );
    }

    #[test]
    fn test_matches_filter() {
        assert!(matches_filter(None, None));
        assert!(matches_filter(Some("a,b"), Some("b")));
        assert!(!matches_filter(Some("a,b"), Some("c")));
        assert!(!matches_filter(Some("a"), None));
    }
}
