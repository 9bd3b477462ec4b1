//! Cloud Foundry V3 API client library.
//!
//! A Rust library for talking to the Cloud Foundry V3 API. It handles
//! authentication against the platform's OAuth2 token endpoint, transparent
//! re-authentication when a token is rejected, request execution with a
//! bounded redirect chain, walking paginated collections, and waiting for
//! asynchronous jobs.
//!
//! # Quick Start
//!
//! ```no_run
//! use cfclient::{App, CfClient, Delete, Get, List, ListOptions};
//!
//! #[tokio::main]
//! async fn main() -> cfclient::Result<()> {
//!     // Create client from environment variables
//!     let client = CfClient::from_env().await?;
//!
//!     // List every app, following pagination links
//!     let apps = App::list_all(&client, &ListOptions::new()).await?;
//!     println!("Found {} apps", apps.len());
//!
//!     // Delete one and wait for the platform job to finish
//!     if let Some(app) = apps.first() {
//!         let job = App::delete(&client, app.guid.clone()).await?;
//!         client.jobs().wait_for_job(&job).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Requests flow through three layers:
//!
//! - [`Executor`] builds the HTTP request from a [`Request`] value
//! - [`AuthenticatedTransport`] attaches a bearer token and re-authenticates
//!   on 401 by asking a [`TokenSourceCreator`] for a fresh source
//! - [`TokenSource`] runs the OAuth2 password, client-credentials or
//!   refresh-token grant and caches the result
//!
//! Resource types implement [`Get`], [`List`], [`Update`] and [`Delete`]
//! as supported by their endpoints.
//!
//! # Configuration
//!
//! [`Config::from_env`] reads:
//!
//! - `CF_API` (required) - API address, e.g. `https://api.sys.example.com`
//! - `CF_USERNAME` / `CF_PASSWORD` - user credentials
//! - `CF_CLIENT_ID` / `CF_CLIENT_SECRET` - client credentials
//! - `CF_ACCESS_TOKEN` / `CF_REFRESH_TOKEN` - an already issued token
//! - `CF_TOKEN_URL` (optional) - token endpoint, discovered from the API
//!   root when unset
//! - `CF_SKIP_SSL_VALIDATION` (optional) - accept invalid certificates

mod auth;
mod client;
mod config;
mod error;
mod executor;
mod models;
mod pagination;
mod polling;
mod request;
mod traits;
mod transport;

pub mod cli;
pub mod output;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use client::CfClient;
pub use config::{Config, Credentials, DEFAULT_OAUTH_CLIENT_ID, DEFAULT_USER_AGENT};
pub use error::{ApiError, CfError, ErrorEnvelope, Result, CODE_NOT_FOUND, CODE_RESOURCE_NOT_FOUND};
pub use executor::{job_guid_from_location, Executor};
pub use request::{Request, RequestBody};

// Authentication and transport
pub use auth::{OAuthTokenSourceCreator, Token, TokenProvider, TokenSource, TokenSourceCreator};
pub use transport::{AuthenticatedTransport, AuthorizedClient, HttpClients, MAX_REDIRECTS};

// Pagination and polling
pub use pagination::{Link, ListOptions, Page, PageWalker, Pagination};
pub use polling::{
    poll_until_terminal, JobPoller, PollOptions, PollOutcome, DEFAULT_POLL_INTERVAL,
    DEFAULT_POLL_TIMEOUT,
};

// Re-export traits
pub use traits::{Delete, Get, List, Update};

// Re-export models
pub use models::{
    // App types
    App,
    AppRelationships,
    AppState,
    AppUpdate,
    Lifecycle,
    // Organization and space types
    Organization,
    OrganizationRelationships,
    Space,
    SpaceRelationships,
    // Asynchronous operations
    Build,
    BuildState,
    Job,
    JobState,
    JobWarning,
    Package,
    PackageState,
    // Shared
    GuidRef,
    Links,
    Metadata,
    ToOneRelationship,
};
