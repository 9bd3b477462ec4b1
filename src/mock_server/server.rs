//! Mock Cloud Foundry API server.
//!
//! Provides an axum-based HTTP server that serves both the V3 API and the
//! OAuth token endpoint.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::{DefaultScenario, Fixtures};
use super::handlers;
use super::state::{MockState, DEFAULT_PASSWORD, DEFAULT_USERNAME};
use crate::{CfClient, Config, Credentials};

/// A mock Cloud Foundry platform for testing.
///
/// The server runs in the background on a random port.
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with the default scenario.
    pub async fn start() -> Self {
        Self::with_state(Self::default_state()).await
    }

    /// Start a mock server with no resources.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    pub async fn with_state(mut state: MockState) -> Self {
        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");
        let url = format!("http://{}", addr);

        state.base_url = url.clone();
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url,
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The token endpoint served by this server.
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.url)
    }

    /// Get access to the server's shared state.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// A config that logs in as the default user.
    pub fn config(&self) -> crate::Result<Config> {
        Config::new(
            &self.url,
            Credentials::password(DEFAULT_USERNAME, DEFAULT_PASSWORD),
        )?
        .with_token_url(&self.token_url())
    }

    /// A client logged in as the default user.
    pub async fn client(&self) -> crate::Result<CfClient> {
        CfClient::new(self.config()?)
    }

    /// Reject every token issued so far.
    pub async fn revoke_tokens(&self) {
        self.state.write().await.revoke_tokens();
    }

    /// Number of tokens the token endpoint has issued.
    pub async fn token_requests(&self) -> u64 {
        self.state.read().await.token_requests
    }

    /// Shutdown the server.
    ///
    /// This aborts the server task. It's safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    fn default_state() -> MockState {
        Self::state_from_scenario(Fixtures::default_scenario())
    }

    fn state_from_scenario(scenario: DefaultScenario) -> MockState {
        let mut state = MockState::new();
        state.organizations = scenario.organizations;
        state.spaces = scenario.spaces;
        state.apps = scenario.apps;
        state
    }

    /// Create the axum router with all routes.
    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        Router::new()
            .route("/", get(handlers::root))
            .route("/oauth/token", post(handlers::issue_token))
            // App routes
            .route("/v3/apps", get(handlers::list_apps))
            .route(
                "/v3/apps/:guid",
                get(handlers::get_app)
                    .patch(handlers::update_app)
                    .delete(handlers::delete_app),
            )
            // Organization and space routes
            .route("/v3/organizations", get(handlers::list_organizations))
            .route("/v3/organizations/:guid", get(handlers::get_organization))
            .route("/v3/spaces", get(handlers::list_spaces))
            .route("/v3/spaces/:guid", get(handlers::get_space))
            // Jobs
            .route("/v3/jobs/:guid", get(handlers::get_job))
            // Health check
            .route("/health", get(health_check))
            .with_state(state)
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}
