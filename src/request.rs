//! Request values handed to the executor.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;

use crate::error::{CfError, Result};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Body of a [`Request`].
///
/// Raw bytes and JSON are mutually exclusive; setting one replaces the
/// other. Bodies are always held in memory so the request can be re-sent
/// after re-authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Pre-encoded bytes sent as-is.
    Raw(Vec<u8>),
    /// A value already serialized to JSON.
    Json(Vec<u8>),
}

impl RequestBody {
    /// The encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Raw(bytes) | Self::Json(bytes) => bytes,
        }
    }
}

/// A single API request: method, path and query, optional body and headers.
///
/// The path is relative to the configured API address. Requests are built
/// per call and not modified once handed to the executor.
///
/// # Example
///
/// ```
/// use cfclient::Request;
///
/// # fn example() -> cfclient::Result<()> {
/// let request = Request::post("/v3/spaces")
///     .json(&serde_json::json!({ "name": "dev" }))?
///     .header("X-Request-Id", "abc")?;
/// assert_eq!(request.path(), "/v3/spaces");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    body: Option<RequestBody>,
    content_type: Option<String>,
    content_length: Option<u64>,
    headers: HeaderMap,
    follow_redirects: bool,
}

impl Request {
    /// Create a request with the given method and path (including query).
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            content_type: None,
            content_length: None,
            headers: HeaderMap::new(),
            follow_redirects: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Serialize `value` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`CfError::Encode`] if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(value).map_err(CfError::Encode)?;
        self.body = Some(RequestBody::Json(bytes));
        self.content_type = Some(JSON_CONTENT_TYPE.to_string());
        Ok(self)
    }

    /// Use pre-encoded bytes as the body.
    #[must_use]
    pub fn raw(mut self, bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Raw(bytes.into()));
        self.content_type = Some(content_type.into());
        self
    }

    /// Send an explicit `Content-Length` instead of the body length.
    #[must_use]
    pub fn content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    /// Add an extra header.
    ///
    /// # Errors
    ///
    /// Returns [`CfError::Config`] if the name or value is not a valid header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CfError::Config(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| CfError::Config(format!("invalid header value for '{name}': {e}")))?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Return 3xx responses as-is instead of following them.
    ///
    /// Used when the caller wants the `Location` header itself, e.g. to
    /// extract a job identifier.
    #[must_use]
    pub fn without_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }

    /// Same request with a different path. Used to follow pagination links.
    pub(crate) fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn explicit_content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn follows_redirects(&self) -> bool {
        self.follow_redirects
    }

    /// Value of a query parameter in the request path, if present.
    pub fn query_param(&self, key: &str) -> Option<String> {
        let (_, query) = self.path.split_once('?')?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}
