//! Cloud Foundry API client.
//!
//! Wires the token source, the authenticated transport and the executor
//! together. Resource-level operations are implemented via traits on the
//! model types.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::{OAuthTokenSourceCreator, TokenSourceCreator};
use crate::config::Config;
use crate::error::Result;
use crate::executor::Executor;
use crate::pagination::{ListOptions, Page, PageWalker};
use crate::polling::{JobPoller, PollOptions};
use crate::request::Request;
use crate::transport::{AuthenticatedTransport, HttpClients};

/// Cloud Foundry V3 API client.
///
/// This struct is cheaply cloneable; clones share the connection pool, the
/// token source and the cancellation token.
///
/// # Example
///
/// ```no_run
/// use cfclient::{App, CfClient, Config, Credentials, List, ListOptions};
///
/// # async fn example() -> cfclient::Result<()> {
/// let config = Config::new("https://api.sys.example.com", Credentials::password("admin", "pw"))?;
/// let client = CfClient::connect(config).await?;
///
/// let apps = App::list_all(&client, &ListOptions::new().per_page(100)).await?;
/// println!("{} apps", apps.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CfClient {
    executor: Executor,
    cancel: CancellationToken,
    poll_options: PollOptions,
    max_pages: Option<u32>,
}

impl std::fmt::Debug for CfClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CfClient")
            .field("base_url", &self.executor.base_url().as_str())
            .finish_non_exhaustive()
    }
}

impl CfClient {
    /// Create a client from environment variables.
    ///
    /// See [`Config::from_env`]. The token endpoint is looked up from the
    /// API root when `CF_TOKEN_URL` is not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment is incomplete or discovery fails.
    pub async fn from_env() -> Result<Self> {
        Self::connect(Config::from_env()?).await
    }

    /// Discover the token endpoint if needed, then create the client.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails or the configuration is invalid.
    pub async fn connect(config: Config) -> Result<Self> {
        Self::new(config.discover().await?)
    }

    /// Create a client. No network call happens until the first request.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CfError::Config`] if the token endpoint is missing.
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let http = HttpClients::new(&config)?;
        let creator = OAuthTokenSourceCreator::new(Arc::clone(&config), http)?;
        Self::with_creator(&config, Arc::new(creator))
    }

    /// Create a client that obtains token sources from `creator`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured user agent is invalid.
    pub fn with_creator(config: &Config, creator: Arc<dyn TokenSourceCreator>) -> Result<Self> {
        let transport = AuthenticatedTransport::new(creator, config.max_auth_retries);
        let executor = Executor::new(
            Arc::new(transport),
            config.api_url.clone(),
            &config.user_agent,
        )?;

        Ok(Self {
            executor,
            cancel: CancellationToken::new(),
            poll_options: PollOptions::default(),
            max_pages: None,
        })
    }

    /// Use `token` to cancel every in-flight operation of this client.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Interval and timeout used by [`CfClient::jobs`].
    #[must_use]
    pub fn with_poll_options(mut self, options: PollOptions) -> Self {
        self.poll_options = options;
        self
    }

    /// Cap the number of pages a single list walk may fetch.
    #[must_use]
    pub fn with_max_pages(mut self, max: u32) -> Self {
        self.max_pages = Some(max);
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        self.executor.base_url()
    }

    /// The request executor.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Token that cancels this client's operations.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The current `Authorization` header value (`bearer <token>`).
    pub async fn token(&self) -> Result<String> {
        self.executor.transport().token().await
    }

    /// A page walker bound to this client.
    pub fn pages(&self) -> PageWalker {
        let walker = PageWalker::new(self.executor.clone());
        match self.max_pages {
            Some(max) => walker.with_max_pages(max),
            None => walker,
        }
    }

    /// A job poller bound to this client.
    pub fn jobs(&self) -> JobPoller {
        JobPoller::new(self.clone(), self.poll_options.clone())
    }

    /// GET `path` and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.executor
            .execute_json(Request::get(path), &self.cancel)
            .await
    }

    /// POST a JSON body to `path` and decode the JSON response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = Request::post(path).json(body)?;
        self.executor.execute_json(request, &self.cancel).await
    }

    /// PATCH a JSON body to `path` and decode the JSON response.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = Request::patch(path).json(body)?;
        self.executor.execute_json(request, &self.cancel).await
    }

    /// DELETE `path`, returning the guid of the job the platform started.
    pub async fn delete_async(&self, path: &str) -> Result<String> {
        self.executor
            .execute_for_job(Request::delete(path), &self.cancel)
            .await
    }

    /// Fetch one page of the collection at `path`.
    pub async fn list_page<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &ListOptions,
    ) -> Result<Page<T>> {
        self.pages()
            .first_page(Request::get(options.apply(path)), &self.cancel)
            .await
    }

    /// Fetch every page of the collection at `path`.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &ListOptions,
    ) -> Result<Vec<T>> {
        self.pages()
            .list_all(Request::get(options.apply(path)), &self.cancel)
            .await
    }
}
