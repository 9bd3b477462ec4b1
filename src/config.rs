//! Client configuration.
//!
//! A [`Config`] names the API endpoint, the token endpoint and exactly one
//! way to authenticate. Everything else has a default.

use std::env;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{CfError, Result};

/// User agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = concat!("cfclient/", env!("CARGO_PKG_VERSION"));

/// OAuth client used by the `cf` CLI for password and token grants.
pub const DEFAULT_OAUTH_CLIENT_ID: &str = "cf";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// How the client authenticates against the token endpoint.
///
/// Exactly one mode is active per configuration.
#[derive(Clone)]
pub enum Credentials {
    /// Resource-owner password grant.
    Password { username: String, password: String },
    /// Client-credentials grant.
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
    /// A token obtained elsewhere (e.g. from `cf oauth-token`).
    Token {
        access_token: String,
        refresh_token: Option<String>,
    },
}

impl Credentials {
    /// Password grant credentials.
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Client-credentials grant credentials.
    pub fn client_credentials(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self::ClientCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// A pre-existing access token, optionally refreshable.
    pub fn token(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self::Token {
            access_token: access_token.into(),
            refresh_token,
        }
    }

    /// Short name of the grant, safe to log.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::ClientCredentials { .. } => "client_credentials",
            Self::Token { .. } => "token",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Self::Token { refresh_token, .. } => f
                .debug_struct("Token")
                .field("refreshable", &refresh_token.is_some())
                .finish_non_exhaustive(),
        }
    }
}

/// Client configuration.
///
/// # Example
///
/// ```no_run
/// use cfclient::{Config, Credentials};
///
/// # fn example() -> cfclient::Result<()> {
/// let config = Config::new(
///     "https://api.sys.example.com",
///     Credentials::password("admin", "secret"),
/// )?
/// .with_token_url("https://login.sys.example.com/oauth/token")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Config {
    pub(crate) api_url: Url,
    pub(crate) token_url: Option<Url>,
    pub(crate) credentials: Credentials,
    pub(crate) oauth_client_id: String,
    pub(crate) oauth_client_secret: String,
    pub(crate) user_agent: String,
    pub(crate) skip_tls_validation: bool,
    pub(crate) request_timeout: Duration,
    pub(crate) max_auth_retries: Option<u32>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url.as_str())
            .field("token_url", &self.token_url.as_ref().map(Url::as_str))
            .field("credentials", &self.credentials)
            .field("oauth_client_id", &self.oauth_client_id)
            .field("user_agent", &self.user_agent)
            .field("skip_tls_validation", &self.skip_tls_validation)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Create a configuration for the given API endpoint.
    ///
    /// The token endpoint must be set with [`Config::with_token_url`] or
    /// looked up with [`Config::discover`] before a client is built.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_url` is not a valid URL.
    pub fn new(api_url: &str, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            api_url: parse_base_url(api_url)?,
            token_url: None,
            credentials,
            oauth_client_id: DEFAULT_OAUTH_CLIENT_ID.to_string(),
            oauth_client_secret: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            skip_tls_validation: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_auth_retries: None,
        })
    }

    /// Create a configuration from environment variables.
    ///
    /// Reads `CF_API` (required) and one credential set, checked in order:
    /// `CF_ACCESS_TOKEN` (+ optional `CF_REFRESH_TOKEN`),
    /// `CF_CLIENT_ID` + `CF_CLIENT_SECRET`, `CF_USERNAME` + `CF_PASSWORD`.
    /// `CF_TOKEN_URL` and `CF_SKIP_SSL_VALIDATION` are optional.
    ///
    /// # Errors
    ///
    /// Returns an error if `CF_API` or every credential set is missing.
    pub fn from_env() -> Result<Self> {
        let api_url = env::var("CF_API").map_err(|_| {
            CfError::Config("CF_API environment variable not set".to_string())
        })?;

        let credentials = if let Ok(access_token) = env::var("CF_ACCESS_TOKEN") {
            Credentials::token(access_token, env::var("CF_REFRESH_TOKEN").ok())
        } else if let (Ok(id), Ok(secret)) =
            (env::var("CF_CLIENT_ID"), env::var("CF_CLIENT_SECRET"))
        {
            Credentials::client_credentials(id, secret)
        } else if let (Ok(user), Ok(pass)) = (env::var("CF_USERNAME"), env::var("CF_PASSWORD")) {
            Credentials::password(user, pass)
        } else {
            return Err(CfError::Config(
                "no credentials: set CF_ACCESS_TOKEN, CF_CLIENT_ID/CF_CLIENT_SECRET or CF_USERNAME/CF_PASSWORD"
                    .to_string(),
            ));
        };

        let mut config = Self::new(&api_url, credentials)?;
        if let Ok(token_url) = env::var("CF_TOKEN_URL") {
            config = config.with_token_url(&token_url)?;
        }
        if let Ok(skip) = env::var("CF_SKIP_SSL_VALIDATION") {
            config.skip_tls_validation = matches!(skip.as_str(), "1" | "true" | "yes");
        }
        Ok(config)
    }

    /// Set the OAuth token endpoint (e.g. `https://login.example.com/oauth/token`).
    ///
    /// # Errors
    ///
    /// Returns an error if `token_url` is not a valid URL.
    pub fn with_token_url(mut self, token_url: &str) -> Result<Self> {
        self.token_url = Some(Url::parse(token_url)?);
        Ok(self)
    }

    /// Override the OAuth client used for password and token grants.
    #[must_use]
    pub fn with_oauth_client(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.oauth_client_id = client_id.into();
        self.oauth_client_secret = client_secret.into();
        self
    }

    /// Override the User-Agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Accept invalid TLS certificates.
    #[must_use]
    pub fn with_skip_tls_validation(mut self, skip: bool) -> Self {
        self.skip_tls_validation = skip;
        self
    }

    /// Per-request timeout of the underlying HTTP client.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Cap the number of consecutive 401-driven re-authentications per
    /// request. Unlimited by default.
    #[must_use]
    pub fn with_max_auth_retries(mut self, max: u32) -> Self {
        self.max_auth_retries = Some(max);
        self
    }

    /// Fill in the token endpoint from the API root document.
    ///
    /// Does nothing if a token endpoint is already configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the root document cannot be fetched or does not
    /// advertise a login endpoint.
    #[tracing::instrument(skip(self), fields(api_url = %self.api_url))]
    pub async fn discover(mut self) -> Result<Self> {
        if self.token_url.is_some() {
            return Ok(self);
        }

        let http = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .danger_accept_invalid_certs(self.skip_tls_validation)
            .timeout(self.request_timeout)
            .build()?;

        let response = http.get(self.api_url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(crate::error::decode_error(status, &body));
        }

        let root: RootInfo = serde_json::from_str(&body)?;
        let login = root
            .links
            .login
            .or(root.links.uaa)
            .ok_or_else(|| CfError::Config("API root advertises no login endpoint".to_string()))?;

        let token_url = format!("{}/oauth/token", login.href.trim_end_matches('/'));
        tracing::debug!(%token_url, "discovered token endpoint");
        self.with_token_url(&token_url)
    }

    /// The API base URL (always ends with `/`).
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// The OAuth token endpoint, if known.
    pub fn token_url(&self) -> Option<&Url> {
        self.token_url.as_ref()
    }

    /// The active credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The token endpoint, or a configuration error if it was never set.
    pub(crate) fn require_token_url(&self) -> Result<&Url> {
        self.token_url.as_ref().ok_or_else(|| {
            CfError::Config(
                "token endpoint not configured: call with_token_url or discover".to_string(),
            )
        })
    }
}

/// The subset of `GET /` the client cares about.
#[derive(Debug, Deserialize)]
struct RootInfo {
    links: RootLinks,
}

#[derive(Debug, Deserialize)]
struct RootLinks {
    #[serde(default)]
    login: Option<RootLink>,
    #[serde(default)]
    uaa: Option<RootLink>,
}

#[derive(Debug, Deserialize)]
struct RootLink {
    href: String,
}

fn parse_base_url(raw: &str) -> Result<Url> {
    // Ensure base URL ends with /
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Ok(Url::parse(&with_slash)?)
}
