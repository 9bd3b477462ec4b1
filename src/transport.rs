//! HTTP transport with transparent re-authentication.
//!
//! [`AuthenticatedTransport`] sends a request with the current token
//! source's client. When the response is a 401 it throws the source away,
//! asks the [`TokenSourceCreator`] for a new one and sends the buffered
//! request again, for as long as the platform keeps answering 401 (unless a
//! cap is configured).

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;

use crate::auth::{TokenProvider, TokenSourceCreator};
use crate::config::Config;
use crate::error::{CfError, Result};

/// Maximum number of redirect hops followed for a single request.
pub const MAX_REDIRECTS: usize = 10;

/// The pair of HTTP clients every request goes through.
///
/// One follows redirects up to [`MAX_REDIRECTS`], the other never follows.
/// Cheap to clone; clones share connection pools.
#[derive(Debug, Clone)]
pub struct HttpClients {
    follow: Client,
    no_follow: Client,
}

impl HttpClients {
    /// Build both clients from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            follow: Self::builder(config).redirect(redirect_policy()).build()?,
            no_follow: Self::builder(config).redirect(Policy::none()).build()?,
        })
    }

    fn builder(config: &Config) -> reqwest::ClientBuilder {
        Client::builder()
            .user_agent(&config.user_agent)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.skip_tls_validation)
    }

    /// Client that follows redirects.
    pub fn follow(&self) -> &Client {
        &self.follow
    }

    /// Client that returns 3xx responses as-is.
    pub fn no_follow(&self) -> &Client {
        &self.no_follow
    }
}

fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error(format!("stopped after {MAX_REDIRECTS} redirects"))
        } else {
            attempt.follow()
        }
    })
}

fn map_send_error(err: reqwest::Error) -> CfError {
    if err.is_redirect() {
        CfError::TooManyRedirects { max: MAX_REDIRECTS }
    } else {
        CfError::Http(err)
    }
}

/// HTTP clients pre-wired with one bearer token.
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    http: HttpClients,
    authorization: HeaderValue,
}

impl AuthorizedClient {
    /// # Errors
    ///
    /// Returns [`CfError::Auth`] if the token is not a valid header value.
    pub fn new(http: HttpClients, authorization: &str) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(authorization)
            .map_err(|_| CfError::Auth("access token is not a valid header value".to_string()))?;
        authorization.set_sensitive(true);
        Ok(Self {
            http,
            authorization,
        })
    }

    /// Send `request` with the `Authorization` header set.
    ///
    /// # Errors
    ///
    /// Returns [`CfError::TooManyRedirects`] when the redirect cap is hit and
    /// [`CfError::Http`] for any other transport failure.
    pub async fn execute(
        &self,
        mut request: reqwest::Request,
        follow_redirects: bool,
    ) -> Result<reqwest::Response> {
        request
            .headers_mut()
            .insert(AUTHORIZATION, self.authorization.clone());

        let client = if follow_redirects {
            &self.http.follow
        } else {
            &self.http.no_follow
        };
        client.execute(request).await.map_err(map_send_error)
    }
}

#[derive(Clone)]
struct CurrentSource {
    generation: u64,
    provider: Arc<dyn TokenProvider>,
}

/// Transport that recovers from credential expiry mid-stream.
pub struct AuthenticatedTransport {
    creator: Arc<dyn TokenSourceCreator>,
    current: Mutex<Option<CurrentSource>>,
    max_auth_retries: Option<u32>,
}

impl std::fmt::Debug for AuthenticatedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedTransport")
            .field("max_auth_retries", &self.max_auth_retries)
            .finish_non_exhaustive()
    }
}

impl AuthenticatedTransport {
    /// Create a transport. The first token source is created lazily.
    pub fn new(creator: Arc<dyn TokenSourceCreator>, max_auth_retries: Option<u32>) -> Self {
        Self {
            creator,
            current: Mutex::new(None),
            max_auth_retries,
        }
    }

    /// The current `Authorization` header value, creating a source if needed.
    pub async fn token(&self) -> Result<String> {
        self.source().await?.provider.token().await
    }

    /// Send `request`, re-authenticating and re-sending on every 401.
    ///
    /// Non-401 responses, including other errors, are returned as-is.
    ///
    /// # Errors
    ///
    /// Returns [`CfError::ExceededMaxAttempts`] if a retry cap is configured
    /// and exceeded, and propagates token and transport errors.
    pub async fn round_trip(
        &self,
        request: reqwest::Request,
        follow_redirects: bool,
    ) -> Result<reqwest::Response> {
        let mut current = self.source().await?;
        let mut retries: u32 = 0;

        loop {
            let attempt = request.try_clone().ok_or_else(|| {
                CfError::Config("request body cannot be buffered for re-sending".to_string())
            })?;
            let client = current.provider.client().await?;
            let response = client.execute(attempt, follow_redirects).await?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }

            retries += 1;
            if let Some(max) = self.max_auth_retries {
                if retries > max {
                    return Err(CfError::ExceededMaxAttempts {
                        operation: "re-authenticating after 401 responses",
                        max,
                    });
                }
            }

            // Drain so the connection can be reused.
            let _ = response.bytes().await;
            tracing::warn!(
                url = %request.url(),
                retries,
                "received 401, re-authenticating with a new token source"
            );
            current = self.renew(current.generation).await?;
        }
    }

    async fn source(&self) -> Result<CurrentSource> {
        let mut current = self.current.lock().await;
        if let Some(source) = current.as_ref() {
            return Ok(source.clone());
        }
        let source = CurrentSource {
            generation: 0,
            provider: self.creator.create().await?,
        };
        *current = Some(source.clone());
        Ok(source)
    }

    /// Swap in a new source unless another request already replaced the
    /// stale one.
    async fn renew(&self, stale_generation: u64) -> Result<CurrentSource> {
        let mut current = self.current.lock().await;
        if let Some(source) = current.as_ref() {
            if source.generation != stale_generation {
                return Ok(source.clone());
            }
        }
        let source = CurrentSource {
            generation: stale_generation + 1,
            provider: self.creator.create().await?,
        };
        *current = Some(source.clone());
        Ok(source)
    }
}
