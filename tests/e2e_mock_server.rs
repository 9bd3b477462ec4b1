//! E2E tests using the mock Cloud Foundry server.
//!
//! These tests exercise full workflows against the mock server,
//! testing realistic scenarios rather than individual endpoints.

#![cfg(feature = "test-server")]

use std::time::Duration;

use cfclient::mock_server::{Fixtures, MockServer, MockState};
use cfclient::{
    App, AppUpdate, CfClient, CfError, Config, Credentials, Delete, Get, JobState, List,
    ListOptions, Metadata, Organization, PollOptions, Space, Update,
};

fn fast_polls(client: CfClient) -> CfClient {
    client.with_poll_options(PollOptions::new(
        Duration::from_millis(10),
        Some(Duration::from_secs(5)),
    ))
}

// =============================================================================
// Server Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_server_starts_on_random_port() {
    let server1 = MockServer::start().await;
    let server2 = MockServer::start().await;

    // Both servers should have different URLs
    assert_ne!(server1.url(), server2.url());

    server1.shutdown().await;
    server2.shutdown().await;
}

#[tokio::test]
async fn test_server_shutdown_is_clean() {
    let server = MockServer::start().await;
    let url = server.url().to_string();

    server.shutdown().await;

    // After shutdown, server should not respond
    let client = reqwest::Client::new();
    let result = client.get(format!("{}/health", url)).send().await;

    assert!(result.is_err());
}

// =============================================================================
// Authentication Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_discovery_and_login() {
    let server = MockServer::start().await;

    let config = Config::new(server.url(), Credentials::password("admin", "admin")).unwrap();
    let client = CfClient::connect(config).await.expect("Failed to connect");

    let orgs = Organization::list_all(&client, &ListOptions::new())
        .await
        .expect("Failed to list organizations");
    assert_eq!(orgs.len(), 1);
    assert_eq!(server.token_requests().await, 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_wrong_password_is_auth_error() {
    let server = MockServer::start().await;

    let config = Config::new(server.url(), Credentials::password("admin", "wrong"))
        .unwrap()
        .with_token_url(&server.token_url())
        .unwrap();
    let client = CfClient::new(config).unwrap();

    let err = App::get(&client, "app-1".to_string()).await.unwrap_err();
    assert!(matches!(err, CfError::Auth(_)), "got {err:?}");

    server.shutdown().await;
}

#[tokio::test]
async fn test_revoked_token_triggers_reauthentication() {
    let server = MockServer::start().await;
    let client = server.client().await.unwrap();

    let before = App::get(&client, "app-1".to_string()).await.unwrap();
    assert_eq!(server.token_requests().await, 1);

    server.revoke_tokens().await;

    let after = App::get(&client, "app-1".to_string())
        .await
        .expect("client should log in again after revocation");
    assert_eq!(before.guid, after.guid);
    assert_eq!(server.token_requests().await, 2);

    server.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_requests_after_revocation_share_one_login() {
    let server = MockServer::start().await;
    let client = server.client().await.unwrap();

    App::get(&client, "app-1".to_string()).await.unwrap();
    server.revoke_tokens().await;

    let tasks: Vec<_> = (1..=5)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { App::get(&client, format!("app-{i}")).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // One initial login plus one renewal shared by every waiter.
    assert_eq!(server.token_requests().await, 2);

    server.shutdown().await;
}

// =============================================================================
// Pagination Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_list_all_walks_every_page() {
    let server = MockServer::start().await;
    let client = server.client().await.unwrap();

    let apps = App::list_all(&client, &ListOptions::new().per_page(2))
        .await
        .expect("Failed to list apps");

    let guids: Vec<&str> = apps.iter().map(|a| a.guid.as_str()).collect();
    assert_eq!(guids, ["app-1", "app-2", "app-3", "app-4", "app-5"]);

    server.shutdown().await;
}

#[tokio::test]
async fn test_explicit_page_returns_only_that_page() {
    let server = MockServer::start().await;
    let client = server.client().await.unwrap();

    let apps = App::list_all(&client, &ListOptions::new().page(3).per_page(2))
        .await
        .unwrap();
    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].guid, "app-5");

    let page = App::list_page(&client, &ListOptions::new().page(1).per_page(2))
        .await
        .unwrap();
    assert_eq!(page.total(), 5);
    assert_eq!(page.pagination.total_pages, 3);
    assert!(page.has_more());

    server.shutdown().await;
}

#[tokio::test]
async fn test_filters_are_kept_across_pages() {
    let server = MockServer::start().await;
    let client = server.client().await.unwrap();

    let apps = App::list_all(
        &client,
        &ListOptions::new().per_page(1).filter("space_guids", "space-1"),
    )
    .await
    .unwrap();
    assert_eq!(apps.len(), 3);
    assert!(apps.iter().all(|a| a.space_guid() == Some("space-1")));

    let spaces = Space::list_in_organization(&client, "org-1").await.unwrap();
    assert_eq!(spaces.len(), 2);

    server.shutdown().await;
}

#[tokio::test]
async fn test_find_app_by_name() {
    let server = MockServer::start().await;
    let client = server.client().await.unwrap();

    let app = App::find_by_name(&client, "space-2", "frontend").await.unwrap();
    assert_eq!(app.guid, "app-4");

    let err = App::find_by_name(&client, "space-2", "nope").await.unwrap_err();
    assert!(matches!(err, CfError::NoResults));

    // Two apps share the name across spaces.
    let err = App::single(&client, &ListOptions::new().filter("names", "frontend"))
        .await
        .unwrap_err();
    assert!(matches!(err, CfError::MultipleResults(2)));

    server.shutdown().await;
}

// =============================================================================
// Resource Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_get_space_and_organization() {
    let server = MockServer::start().await;
    let client = server.client().await.unwrap();

    let space = Space::get(&client, "space-2".to_string()).await.unwrap();
    assert_eq!(space.name, "staging");

    let org_guid = space.organization_guid().unwrap().to_string();
    let org = Organization::get(&client, org_guid).await.unwrap();
    assert_eq!(org.name, "acme");

    server.shutdown().await;
}

#[tokio::test]
async fn test_app_not_found() {
    let server = MockServer::start().await;
    let client = server.client().await.unwrap();

    let err = App::get(&client, "nonexistent".to_string()).await.unwrap_err();

    assert!(err.is_not_found(), "Error should indicate not found: {err}");
    let errors = err.api_errors();
    assert_eq!(errors[0].title, "CF-ResourceNotFound");

    server.shutdown().await;
}

#[tokio::test]
async fn test_update_app_workflow() {
    let server = MockServer::start().await;
    let client = server.client().await.unwrap();

    let params = AppUpdate {
        name: Some("frontend-v2".to_string()),
        ..Default::default()
    };
    let updated = App::update(&client, "app-1".to_string(), params)
        .await
        .expect("Failed to update app");
    assert_eq!(updated.name, "frontend-v2");

    // Verify update persisted
    let fetched = App::get(&client, "app-1".to_string()).await.unwrap();
    assert_eq!(fetched.name, "frontend-v2");

    server.shutdown().await;
}

#[tokio::test]
async fn test_update_app_metadata() {
    let server = MockServer::start().await;
    let client = server.client().await.unwrap();

    let mut metadata = Metadata::default();
    metadata
        .labels
        .insert("env".to_string(), Some("production".to_string()));
    let params = AppUpdate {
        metadata: Some(metadata),
        ..Default::default()
    };
    let updated = App::update(&client, "app-2".to_string(), params)
        .await
        .unwrap();
    assert_eq!(updated.name, "backend");
    assert_eq!(updated.metadata.label("env"), Some("production"));

    // Removing a label with a null value
    let mut removal = Metadata::default();
    removal.labels.insert("env".to_string(), None);
    let params = AppUpdate {
        metadata: Some(removal),
        ..Default::default()
    };
    App::update(&client, "app-2".to_string(), params).await.unwrap();

    let fetched = App::get(&client, "app-2".to_string()).await.unwrap();
    assert_eq!(fetched.metadata.label("env"), None);

    server.shutdown().await;
}

// =============================================================================
// Job Workflow Tests
// =============================================================================

#[tokio::test]
async fn test_delete_app_and_wait_for_job() {
    let state = MockState::new()
        .with_app(Fixtures::app("doomed", "doomed", "space-1"))
        .with_job_polls(2);
    let server = MockServer::with_state(state).await;
    let client = fast_polls(server.client().await.unwrap());

    let job_guid = App::delete(&client, "doomed".to_string()).await.unwrap();
    let job = client.jobs().wait_for_job(&job_guid).await.unwrap();

    assert_eq!(job.state, JobState::Complete);
    assert_eq!(job.operation, "app.delete");

    let err = App::get(&client, "doomed".to_string()).await.unwrap_err();
    assert!(err.is_not_found());

    server.shutdown().await;
}

#[tokio::test]
async fn test_failed_delete_job() {
    let state = MockState::new()
        .with_app(Fixtures::app("doomed", "doomed", "space-1"))
        .with_failing_jobs();
    let server = MockServer::with_state(state).await;
    let client = fast_polls(server.client().await.unwrap());

    let job_guid = App::delete(&client, "doomed".to_string()).await.unwrap();
    let err = client.jobs().wait_for_job(&job_guid).await.unwrap_err();

    match err {
        CfError::JobFailed { errors, .. } => {
            assert_eq!(errors[0].title, "CF-UnprocessableEntity");
        }
        other => panic!("expected JobFailed, got {other:?}"),
    }

    server.shutdown().await;
}

#[tokio::test]
async fn test_slow_job_times_out() {
    let state = MockState::new()
        .with_app(Fixtures::app("doomed", "doomed", "space-1"))
        .with_job_polls(1000);
    let server = MockServer::with_state(state).await;
    let client = server
        .client()
        .await
        .unwrap()
        .with_poll_options(PollOptions::new(
            Duration::from_millis(20),
            Some(Duration::from_millis(100)),
        ));

    let job_guid = App::delete(&client, "doomed".to_string()).await.unwrap();
    let err = client.jobs().wait_for_job(&job_guid).await.unwrap_err();
    assert!(matches!(err, CfError::PollTimeout { .. }));

    server.shutdown().await;
}
