//! Pagination over V3 collection responses.
//!
//! Every collection endpoint wraps its items in the same envelope:
//!
//! ```json
//! { "pagination": { "total_results": 3, "total_pages": 2,
//!     "first": {"href": "..."}, "last": {"href": "..."},
//!     "next": {"href": "..."}, "previous": null },
//!   "resources": [ ... ] }
//! ```
//!
//! [`PageWalker::list_all`] follows `next` links until they run out. Links
//! are assumed to point at the same origin as the configured API address:
//! only their path and query are kept and re-joined against it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{CfError, Result};
use crate::executor::Executor;
use crate::request::Request;

/// A hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// The `pagination` object of a collection response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub first: Option<Link>,
    #[serde(default)]
    pub last: Option<Link>,
    #[serde(default)]
    pub next: Option<Link>,
    #[serde(default)]
    pub previous: Option<Link>,
}

impl Pagination {
    /// The `next` href, if present and non-empty.
    pub fn next_href(&self) -> Option<&str> {
        self.next
            .as_ref()
            .map(|link| link.href.as_str())
            .filter(|href| !href.is_empty())
    }
}

/// A page of results.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    /// The items on this page, in server order.
    pub items: Vec<T>,
    /// Totals and navigation links.
    pub pagination: Pagination,
}

#[derive(Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct ListResponse<T> {
    #[serde(default)]
    pagination: Pagination,
    #[serde(default = "Vec::new")]
    resources: Vec<T>,
}

impl<T> Page<T> {
    /// Whether the server advertised another page.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.pagination.next_href().is_some()
    }

    /// Total number of items across all pages, as declared by the server.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.pagination.total_results
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Query parameters shared by list endpoints.
///
/// ```
/// use cfclient::ListOptions;
///
/// let opts = ListOptions::new()
///     .per_page(50)
///     .order_by("-created_at")
///     .filter("names", "web,worker");
/// assert_eq!(
///     opts.apply("/v3/apps"),
///     "/v3/apps?per_page=50&order_by=-created_at&names=web%2Cworker"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub order_by: Option<String>,
    pub label_selector: Option<String>,
    pub filters: Vec<(String, String)>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the request to one page. Pinned requests are never expanded by
    /// [`PageWalker::list_all`].
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    #[must_use]
    pub fn label_selector(mut self, selector: impl Into<String>) -> Self {
        self.label_selector = Some(selector.into());
        self
    }

    /// Add an endpoint-specific filter such as `names` or `space_guids`.
    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }

    /// Encoded query string, without the leading `?`.
    pub fn to_query(&self) -> String {
        let mut pairs: Vec<(String, String)> = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".into(), page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page".into(), per_page.to_string()));
        }
        if let Some(order_by) = &self.order_by {
            pairs.push(("order_by".into(), order_by.clone()));
        }
        if let Some(selector) = &self.label_selector {
            pairs.push(("label_selector".into(), selector.clone()));
        }
        pairs.extend(self.filters.iter().cloned());

        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append the query string to `path`.
    pub fn apply(&self, path: &str) -> String {
        let query = self.to_query();
        if query.is_empty() {
            path.to_string()
        } else if path.contains('?') {
            format!("{path}&{query}")
        } else {
            format!("{path}?{query}")
        }
    }
}

/// Path and query of a `next` link, relative to `base` so that re-joining
/// keeps any path prefix on the API address.
fn next_path(href: &str, base: &Url) -> Result<String> {
    let url = base.join(href)?;
    let path = url
        .path()
        .strip_prefix(base.path())
        .unwrap_or_else(|| url.path().trim_start_matches('/'));
    Ok(match url.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    })
}

/// Walks paginated collections.
///
/// The walk is bounded only by the server's `next` links unless
/// [`PageWalker::with_max_pages`] sets a cap.
#[derive(Debug, Clone)]
pub struct PageWalker {
    executor: Executor,
    max_pages: Option<u32>,
}

impl PageWalker {
    pub fn new(executor: Executor) -> Self {
        Self {
            executor,
            max_pages: None,
        }
    }

    /// Fail with [`CfError::ExceededMaxAttempts`] instead of fetching more
    /// than `max` pages.
    #[must_use]
    pub fn with_max_pages(mut self, max: u32) -> Self {
        self.max_pages = Some(max);
        self
    }

    /// Fetch and decode one page.
    ///
    /// # Errors
    ///
    /// Returns a decoded API error for non-2xx responses and
    /// [`CfError::Decode`] if the body is not a collection envelope.
    pub async fn first_page<T: DeserializeOwned>(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Page<T>> {
        let response: ListResponse<T> = self.executor.execute_json(request, cancel).await?;
        Ok(Page {
            items: response.resources,
            pagination: response.pagination,
        })
    }

    /// Fetch every page reachable from `request` and return all items in
    /// server order.
    ///
    /// If `request` pins a `page` query parameter only that page is fetched,
    /// even when it advertises a `next` link.
    ///
    /// # Errors
    ///
    /// Propagates the first failing page's error. Returns
    /// [`CfError::ExceededMaxAttempts`] if a page cap is set and exceeded.
    #[tracing::instrument(skip(self, request, cancel), fields(path = request.path()))]
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        let pinned = request.query_param("page").is_some();
        let mut all_items = Vec::new();
        let mut next = Some(request.clone());
        let mut fetched: u32 = 0;

        while let Some(page_request) = next.take() {
            if let Some(max) = self.max_pages {
                if fetched >= max {
                    return Err(CfError::ExceededMaxAttempts {
                        operation: "walking paginated results",
                        max,
                    });
                }
            }

            let page: Page<T> = self.first_page(page_request, cancel).await?;
            fetched += 1;
            tracing::debug!(
                page = fetched,
                items = page.len(),
                total_results = page.pagination.total_results,
                "fetched page"
            );

            if !pinned {
                if let Some(href) = page.pagination.next_href() {
                    next = Some(
                        request.with_path(next_path(href, self.executor.base_url())?),
                    );
                }
            }
            all_items.extend(page.items);
        }

        Ok(all_items)
    }

    /// The first item of the collection.
    ///
    /// # Errors
    ///
    /// Returns [`CfError::NoResults`] if the collection is empty.
    pub async fn first<T: DeserializeOwned>(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let page: Page<T> = self.first_page(request, cancel).await?;
        page.items.into_iter().next().ok_or(CfError::NoResults)
    }

    /// The only item of the collection.
    ///
    /// # Errors
    ///
    /// Returns [`CfError::NoResults`] or [`CfError::MultipleResults`] unless
    /// the server reports exactly one result.
    pub async fn single<T: DeserializeOwned>(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let page: Page<T> = self.first_page(request, cancel).await?;
        let total = page.pagination.total_results.max(page.len() as u64);
        match total {
            0 => Err(CfError::NoResults),
            1 => page.items.into_iter().next().ok_or(CfError::NoResults),
            n => Err(CfError::MultipleResults(n as usize)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_path_strips_origin() {
        let base = Url::parse("https://api.example.com/").unwrap();
        assert_eq!(
            next_path("https://api.example.com/v3/apps?page=2&per_page=50", &base).unwrap(),
            "v3/apps?page=2&per_page=50"
        );
        assert_eq!(
            next_path("https://other.example.com/v3/apps", &base).unwrap(),
            "v3/apps"
        );
        assert_eq!(next_path("/v3/apps?page=3", &base).unwrap(), "v3/apps?page=3");
    }

    #[test]
    fn test_next_path_under_prefixed_base() {
        let base = Url::parse("https://host.example.com/cf/").unwrap();
        assert_eq!(
            next_path("https://host.example.com/cf/v3/apps?page=2", &base).unwrap(),
            "v3/apps?page=2"
        );
        // Links that omit the prefix are still placed under it.
        assert_eq!(
            next_path("https://host.example.com/v3/apps?page=2", &base).unwrap(),
            "v3/apps?page=2"
        );
        assert_eq!(
            base.join(&next_path("/cf/v3/spaces", &base).unwrap())
                .unwrap()
                .as_str(),
            "https://host.example.com/cf/v3/spaces"
        );
    }

    #[test]
    fn test_pagination_next_href() {
        let mut pagination = Pagination::default();
        assert_eq!(pagination.next_href(), None);

        pagination.next = Some(Link {
            href: String::new(),
            method: None,
        });
        assert_eq!(pagination.next_href(), None);

        pagination.next = Some(Link {
            href: "https://api.example.com/v3/apps?page=2".into(),
            method: None,
        });
        assert_eq!(
            pagination.next_href(),
            Some("https://api.example.com/v3/apps?page=2")
        );
    }

    #[test]
    fn test_envelope_decodes_null_links() {
        let body = serde_json::json!({
            "pagination": {
                "total_results": 1,
                "total_pages": 1,
                "first": {"href": "https://api.example.com/v3/apps?page=1"},
                "last": {"href": "https://api.example.com/v3/apps?page=1"},
                "next": null,
                "previous": null
            },
            "resources": [ {"guid": "a"} ]
        });
        let decoded: ListResponse<serde_json::Value> = serde_json::from_value(body).unwrap();
        assert_eq!(decoded.resources.len(), 1);
        assert_eq!(decoded.pagination.total_pages, 1);
        assert!(decoded.pagination.next.is_none());
    }

    #[test]
    fn test_page_map() {
        let page = Page {
            items: vec![1, 2, 3],
            pagination: Pagination {
                total_results: 3,
                ..Default::default()
            },
        };
        let mapped = page.map(|x| x * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.total(), 3);
        assert!(!mapped.has_more());
    }

    #[test]
    fn test_list_options_query() {
        assert_eq!(ListOptions::new().apply("/v3/apps"), "/v3/apps");
        assert_eq!(
            ListOptions::new().page(2).per_page(10).apply("/v3/apps"),
            "/v3/apps?page=2&per_page=10"
        );
        assert_eq!(
            ListOptions::new()
                .label_selector("env=prod")
                .apply("/v3/apps?include=space"),
            "/v3/apps?include=space&label_selector=env%3Dprod"
        );
    }
}
