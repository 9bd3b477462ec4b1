//! Mock Cloud Foundry platform for E2E testing.
//!
//! This module provides an in-memory server that plays both the API and
//! the token endpoint. Unlike wiremock, which mocks at the HTTP level
//! per-test, this server keeps state across requests: deleted apps stay
//! deleted, jobs advance each time they are polled, and revoking tokens
//! forces the client through a real re-authentication.
//!
//! # Example
//!
//! ```ignore
//! use cfclient::mock_server::MockServer;
//! use cfclient::{App, Get};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = server.client().await.unwrap();
//!
//!     // Server comes with default fixtures
//!     let app = App::get(&client, "app-1".to_string()).await.unwrap();
//!     assert_eq!(app.name, "frontend");
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{DefaultScenario, Fixtures};
pub use server::MockServer;
pub use state::{MockJob, MockState, TokenGrant};
