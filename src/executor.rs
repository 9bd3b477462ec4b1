//! Single request execution.
//!
//! The [`Executor`] turns a [`Request`] into exactly one logical round trip
//! through the [`AuthenticatedTransport`]. It does not interpret status
//! codes; [`Executor::check_response`] and the typed helpers layer that on
//! top.

use std::sync::Arc;

use reqwest::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, LOCATION, USER_AGENT};
use reqwest::Response;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{decode_error, CfError, Result};
use crate::request::Request;
use crate::transport::AuthenticatedTransport;

/// Sends [`Request`]s against the configured API address.
///
/// Cheap to clone; clones share the transport and its token source.
#[derive(Debug, Clone)]
pub struct Executor {
    transport: Arc<AuthenticatedTransport>,
    base_url: Arc<Url>,
    user_agent: HeaderValue,
}

impl Executor {
    /// # Errors
    ///
    /// Returns [`CfError::Config`] if `user_agent` is not a valid header value.
    pub fn new(
        transport: Arc<AuthenticatedTransport>,
        base_url: Url,
        user_agent: &str,
    ) -> Result<Self> {
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|_| CfError::Config(format!("invalid user agent '{user_agent}'")))?;
        Ok(Self {
            transport,
            base_url: Arc::new(base_url),
            user_agent,
        })
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The transport requests go through.
    pub fn transport(&self) -> &AuthenticatedTransport {
        &self.transport
    }

    /// Send `request` and return the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`CfError::Cancelled`] if `cancel` fired before or during the
    /// round trip, [`CfError::TooManyRedirects`] if the redirect cap is hit,
    /// and transport or token errors otherwise.
    #[tracing::instrument(
        skip(self, request, cancel),
        fields(method = %request.method(), path = request.path())
    )]
    pub async fn execute(&self, request: Request, cancel: &CancellationToken) -> Result<Response> {
        if cancel.is_cancelled() {
            return Err(CfError::Cancelled);
        }

        let follow_redirects = request.follows_redirects();
        let http_request = self.build(request)?;

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CfError::Cancelled),
            response = self.transport.round_trip(http_request, follow_redirects) => {
                let response = response?;
                tracing::debug!(status = %response.status(), "response received");
                Ok(response)
            }
        }
    }

    /// Send `request`, fail on non-2xx, decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns a decoded API error for non-2xx responses and
    /// [`CfError::Decode`] if a success body does not match `T`.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let response = Self::check_response(self.execute(request, cancel).await?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send `request`, fail on non-2xx, discard the body.
    pub async fn execute_no_content(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<()> {
        Self::check_response(self.execute(request, cancel).await?).await?;
        Ok(())
    }

    /// Send `request` without following redirects and return the job guid
    /// from its `Location` header.
    ///
    /// Used for operations the platform runs asynchronously (202 Accepted
    /// or a redirect to the job resource).
    ///
    /// # Errors
    ///
    /// Returns [`CfError::UnexpectedResponse`] if the response carries no
    /// job location.
    pub async fn execute_for_job(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let response = self.execute(request.without_redirects(), cancel).await?;
        let status = response.status();
        if !status.is_success() && !status.is_redirection() {
            return Err(Self::into_error(response).await);
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match location.as_deref().and_then(job_guid_from_location) {
            Some(guid) => Ok(guid),
            None => Err(CfError::UnexpectedResponse {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body: format!(
                    "expected a job location header, got {}",
                    location.as_deref().unwrap_or("none")
                ),
            }),
        }
    }

    /// Pass 2xx responses through and turn everything else into an error.
    ///
    /// # Errors
    ///
    /// Returns [`CfError::Api`] when the body is a structured error envelope
    /// and [`CfError::UnexpectedResponse`] otherwise.
    pub async fn check_response(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(Self::into_error(response).await)
    }

    async fn into_error(response: Response) -> CfError {
        let status = response.status();
        match response.text().await {
            Ok(body) => decode_error(status, &body),
            Err(e) => CfError::Http(e),
        }
    }

    fn build(&self, request: Request) -> Result<reqwest::Request> {
        // Relative join keeps any path prefix on the base URL.
        let url = self.base_url.join(request.path().trim_start_matches('/'))?;
        let mut http_request = reqwest::Request::new(request.method().clone(), url);

        let headers = http_request.headers_mut();
        for (name, value) in request.headers() {
            headers.append(name.clone(), value.clone());
        }
        headers.insert(USER_AGENT, self.user_agent.clone());
        if let Some(content_type) = request.content_type() {
            let value = HeaderValue::from_str(content_type)
                .map_err(|_| CfError::Config(format!("invalid content type '{content_type}'")))?;
            headers.insert(CONTENT_TYPE, value);
        }
        if let Some(length) = request.explicit_content_length() {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        }

        if let Some(body) = request.body() {
            *http_request.body_mut() = Some(body.as_bytes().to_vec().into());
        }
        Ok(http_request)
    }
}

/// Extract the job guid from a `Location` header (the path segment after
/// `/jobs/`).
///
/// ```
/// use cfclient::job_guid_from_location;
///
/// assert_eq!(
///     job_guid_from_location("https://api.example.com/v3/jobs/b5a1-44c2"),
///     Some("b5a1-44c2".to_string())
/// );
/// assert_eq!(job_guid_from_location("https://api.example.com/v3/apps/x"), None);
/// ```
pub fn job_guid_from_location(location: &str) -> Option<String> {
    let (_, rest) = location.split_once("/jobs/")?;
    let guid = rest.split(['/', '?', '#']).next()?;
    if guid.is_empty() {
        None
    } else {
        Some(guid.to_string())
    }
}
