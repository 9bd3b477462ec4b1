//! OAuth2 token acquisition and caching.
//!
//! A [`TokenSource`] owns one cached [`Token`] and knows how to obtain a new
//! one with the configured grant. The [`AuthenticatedTransport`] never
//! refreshes a source in place after a 401; it asks a [`TokenSourceCreator`]
//! for a brand-new source instead.
//!
//! [`AuthenticatedTransport`]: crate::transport::AuthenticatedTransport

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use crate::config::{Config, Credentials};
use crate::error::{CfError, Result};
use crate::transport::{AuthorizedClient, HttpClients};

/// Tokens are treated as expired this long before their real expiry.
const EXPIRY_LEEWAY_SECS: i64 = 10;

/// An OAuth2 bearer credential.
///
/// Replaced wholesale on refresh; never mutated in place.
#[derive(Clone)]
pub struct Token {
    access_token: String,
    refresh_token: Option<String>,
    token_type: String,
    expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("refreshable", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

impl Token {
    /// A token obtained outside this library. Without expiry information it
    /// is used until the platform rejects it.
    pub fn supplied(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            token_type: "bearer".to_string(),
            expires_at: None,
        }
    }

    /// The raw access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The refresh token, if the grant returned one.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// When the access token stops being valid, if known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns true if the token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|at| Utc::now() + Duration::seconds(EXPIRY_LEEWAY_SECS) >= at)
    }

    /// `Authorization` header value: `bearer <token>`.
    pub fn authorization(&self) -> String {
        format!("bearer {}", self.access_token)
    }

    /// Same token, marked as already expired.
    fn stale(self) -> Self {
        Self {
            expires_at: Some(DateTime::<Utc>::MIN_UTC),
            ..self
        }
    }

    fn from_response(response: TokenResponse, previous_refresh: Option<&str>) -> Self {
        Self {
            access_token: response.access_token,
            // Servers may omit the refresh token on a refresh grant.
            refresh_token: response
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            token_type: response.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_at: response.expires_in.and_then(expiry_from_now),
        }
    }
}

/// `now + secs`, or `None` when the server sent a lifetime that does not fit
/// in a timestamp. Such tokens are kept until a 401 forces renewal.
fn expiry_from_now(secs: i64) -> Option<DateTime<Utc>> {
    let at = Duration::try_seconds(secs).and_then(|d| Utc::now().checked_add_signed(d));
    if at.is_none() {
        tracing::warn!(expires_in = secs, "ignoring out-of-range token lifetime");
    }
    at
}

/// RFC 6749 section 5.1 token response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Something that can hand out authorized clients.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// An HTTP client that presents a currently valid bearer token.
    async fn client(&self) -> Result<AuthorizedClient>;

    /// The current `Authorization` header value (`bearer <token>`).
    async fn token(&self) -> Result<String>;
}

/// Builds fresh token providers.
///
/// Called once for the first request and again after every 401.
#[async_trait]
pub trait TokenSourceCreator: Send + Sync {
    async fn create(&self) -> Result<Arc<dyn TokenProvider>>;
}

/// Obtains and caches a bearer token using the configured grant.
///
/// Refreshes are single-flight: the cache lock is held across the token
/// round trip, so concurrent callers wait for the in-flight refresh and
/// reuse its result.
pub struct TokenSource {
    config: Arc<Config>,
    token_url: Url,
    http: HttpClients,
    cache: Mutex<Option<Token>>,
    latest_refresh: Arc<Mutex<Option<String>>>,
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSource")
            .field("token_url", &self.token_url.as_str())
            .field("mode", &self.config.credentials.mode())
            .finish_non_exhaustive()
    }
}

impl TokenSource {
    /// Create a token source. No network call happens until a token is needed.
    ///
    /// # Errors
    ///
    /// Returns [`CfError::Config`] if no token endpoint is configured.
    pub fn new(config: Arc<Config>, http: HttpClients) -> Result<Self> {
        let initial = match &config.credentials {
            Credentials::Token {
                access_token,
                refresh_token,
            } => Some(Token::supplied(access_token.clone(), refresh_token.clone())),
            _ => None,
        };
        Self::with_initial(config, http, initial, Arc::new(Mutex::new(None)))
    }

    fn with_initial(
        config: Arc<Config>,
        http: HttpClients,
        initial: Option<Token>,
        latest_refresh: Arc<Mutex<Option<String>>>,
    ) -> Result<Self> {
        let token_url = config.require_token_url()?.clone();
        Ok(Self {
            config,
            token_url,
            http,
            cache: Mutex::new(initial),
            latest_refresh,
        })
    }

    /// Return the cached token, acquiring a new one if it is missing or expired.
    pub async fn current(&self) -> Result<Token> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.clone());
        }

        let token = self.acquire(cache.as_ref()).await?;
        if let Some(refresh) = token.refresh_token() {
            *self.latest_refresh.lock().await = Some(refresh.to_string());
        }
        *cache = Some(token.clone());
        Ok(token)
    }

    async fn acquire(&self, previous: Option<&Token>) -> Result<Token> {
        if let Some(refresh) = previous.and_then(Token::refresh_token) {
            match self.refresh_grant(refresh).await {
                Ok(token) => return Ok(token),
                Err(e) if !matches!(self.config.credentials, Credentials::Token { .. }) => {
                    tracing::warn!(error = %e, "refresh grant failed, falling back to primary grant");
                }
                Err(e) => return Err(e),
            }
        }

        match &self.config.credentials {
            Credentials::Password { username, password } => {
                self.request_token(
                    &[
                        ("grant_type", "password"),
                        ("username", username),
                        ("password", password),
                    ],
                    None,
                )
                .await
            }
            Credentials::ClientCredentials { .. } => {
                self.request_token(&[("grant_type", "client_credentials")], None)
                    .await
            }
            Credentials::Token { .. } => Err(CfError::Auth(
                "access token expired or rejected and no refresh token is available".to_string(),
            )),
        }
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<Token> {
        self.request_token(
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ],
            Some(refresh_token),
        )
        .await
    }

    #[tracing::instrument(
        skip(self, form, previous_refresh),
        fields(token_url = %self.token_url, mode = self.config.credentials.mode())
    )]
    async fn request_token(
        &self,
        form: &[(&str, &str)],
        previous_refresh: Option<&str>,
    ) -> Result<Token> {
        let (client_id, client_secret) = match &self.config.credentials {
            Credentials::ClientCredentials {
                client_id,
                client_secret,
            } => (client_id.as_str(), client_secret.as_str()),
            _ => (
                self.config.oauth_client_id.as_str(),
                self.config.oauth_client_secret.as_str(),
            ),
        };

        let response = self
            .http
            .follow()
            .post(self.token_url.clone())
            .basic_auth(client_id, Some(client_secret))
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CfError::Auth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)?;
        if let Some(token_type) = parsed.token_type.as_deref() {
            if !token_type.eq_ignore_ascii_case("bearer") {
                return Err(CfError::Auth(format!(
                    "unsupported token type '{token_type}'"
                )));
            }
        }

        tracing::debug!(expires_in = ?parsed.expires_in, "obtained access token");
        Ok(Token::from_response(parsed, previous_refresh))
    }
}

#[async_trait]
impl TokenProvider for TokenSource {
    async fn client(&self) -> Result<AuthorizedClient> {
        let token = self.current().await?;
        AuthorizedClient::new(self.http.clone(), &token.authorization())
    }

    async fn token(&self) -> Result<String> {
        Ok(self.current().await?.authorization())
    }
}

/// Creates [`TokenSource`]s from a [`Config`].
///
/// For supplied tokens, every source after the first starts from a stale
/// copy of the token so it goes straight to the refresh grant, using the
/// newest refresh token any earlier source received.
pub struct OAuthTokenSourceCreator {
    config: Arc<Config>,
    http: HttpClients,
    created: AtomicU64,
    latest_refresh: Arc<Mutex<Option<String>>>,
}

impl OAuthTokenSourceCreator {
    /// # Errors
    ///
    /// Returns [`CfError::Config`] if no token endpoint is configured.
    pub fn new(config: Arc<Config>, http: HttpClients) -> Result<Self> {
        config.require_token_url()?;
        Ok(Self {
            config,
            http,
            created: AtomicU64::new(0),
            latest_refresh: Arc::new(Mutex::new(None)),
        })
    }
}

#[async_trait]
impl TokenSourceCreator for OAuthTokenSourceCreator {
    async fn create(&self) -> Result<Arc<dyn TokenProvider>> {
        let generation = self.created.fetch_add(1, Ordering::SeqCst);

        let initial = match &self.config.credentials {
            Credentials::Token {
                access_token,
                refresh_token,
            } => {
                let refresh = self
                    .latest_refresh
                    .lock()
                    .await
                    .clone()
                    .or_else(|| refresh_token.clone());
                let token = Token::supplied(access_token.clone(), refresh);
                Some(if generation == 0 { token } else { token.stale() })
            }
            _ => None,
        };

        tracing::debug!(generation, "creating token source");
        let source = TokenSource::with_initial(
            Arc::clone(&self.config),
            self.http.clone(),
            initial,
            Arc::clone(&self.latest_refresh),
        )?;
        Ok(Arc::new(source))
    }
}
