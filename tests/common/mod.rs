//! Helpers shared by the wiremock-based integration tests.

#![allow(dead_code)]

use cfclient::{CfClient, Config, Credentials};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token endpoint path on the mock server.
pub const TOKEN_PATH: &str = "/oauth/token";

pub fn token_body(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "refresh_token": format!("{access_token}-refresh"),
        "expires_in": 3600
    })
}

/// Answer every token request with `access_token`.
pub async fn mount_token(server: &MockServer, access_token: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(access_token)))
        .mount(server)
        .await;
}

/// Config pointing both the API and the token endpoint at `server`.
pub fn config_for(server: &MockServer, credentials: Credentials) -> Config {
    Config::new(&server.uri(), credentials)
        .unwrap()
        .with_token_url(&format!("{}{}", server.uri(), TOKEN_PATH))
        .unwrap()
}

/// A password-mode client for `server`.
pub fn client_for(server: &MockServer) -> CfClient {
    CfClient::new(config_for(server, Credentials::password("admin", "secret"))).unwrap()
}

/// A password-mode client whose API address carries a path `prefix`
/// (`{server}/{prefix}`). The token endpoint stays at the server root.
pub fn prefixed_client_for(server: &MockServer, prefix: &str) -> CfClient {
    let config = Config::new(
        &format!("{}/{prefix}", server.uri()),
        Credentials::password("admin", "secret"),
    )
    .unwrap()
    .with_token_url(&format!("{}{}", server.uri(), TOKEN_PATH))
    .unwrap();
    CfClient::new(config).unwrap()
}

/// A minimal app resource.
pub fn app_json(guid: &str, name: &str) -> Value {
    json!({"guid": guid, "name": name, "state": "STARTED"})
}

/// A collection body with the given apps and `next` link.
pub fn apps_page(names: &[&str], total: usize, next: Option<&str>) -> Value {
    let resources: Vec<Value> = names.iter().map(|n| app_json(n, n)).collect();
    json!({
        "pagination": {
            "total_results": total,
            "total_pages": total.div_ceil(names.len().max(1)),
            "first": {"href": "https://api.example.com/v3/apps?page=1"},
            "last": null,
            "next": next.map(|href| json!({"href": href})),
            "previous": null
        },
        "resources": resources
    })
}
