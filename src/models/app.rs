//! App model and trait implementations.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::CfClient;
use crate::error::Result;
use crate::models::common::{resource_path, Links, Metadata, ToOneRelationship};
use crate::pagination::ListOptions;
use crate::traits::{Delete, Get, List, Update};

const APPS: &str = "/v3/apps";

/// An application.
///
/// Apps live in a space and are backed by packages (source bits), builds
/// (staging runs) and droplets (staged artifacts).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    pub guid: String,
    pub name: String,

    /// Desired state.
    pub state: AppState,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Buildpack or docker lifecycle.
    #[serde(default)]
    pub lifecycle: Option<Lifecycle>,

    #[serde(default)]
    pub relationships: AppRelationships,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppState {
    Started,
    Stopped,
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AppState::Started => "STARTED",
            AppState::Stopped => "STOPPED",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lifecycle {
    #[serde(rename = "type")]
    pub lifecycle_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppRelationships {
    #[serde(default)]
    pub space: ToOneRelationship,
}

impl App {
    /// Guid of the space the app belongs to.
    pub fn space_guid(&self) -> Option<&str> {
        self.relationships.space.guid()
    }

    pub fn is_started(&self) -> bool {
        self.state == AppState::Started
    }

    /// Look up an app by name within a space.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CfError::NoResults`] if no such app exists.
    pub async fn find_by_name(client: &CfClient, space_guid: &str, name: &str) -> Result<Self> {
        let options = ListOptions::new()
            .filter("names", name)
            .filter("space_guids", space_guid);
        <Self as List>::single(client, &options).await
    }
}

/// Fields accepted by `PATCH /v3/apps/:guid`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[async_trait]
impl Get for App {
    type Id = String;

    #[tracing::instrument(skip(client))]
    async fn get(client: &CfClient, guid: String) -> Result<Self> {
        client.get(&resource_path(APPS, &guid)).await
    }
}

impl List for App {
    const PATH: &'static str = APPS;
}

#[async_trait]
impl Update for App {
    type Id = String;
    type Params = AppUpdate;

    #[tracing::instrument(skip(client))]
    async fn update(client: &CfClient, guid: String, params: AppUpdate) -> Result<Self> {
        client.patch(&resource_path(APPS, &guid), &params).await
    }
}

#[async_trait]
impl Delete for App {
    type Id = String;

    #[tracing::instrument(skip(client))]
    async fn delete(client: &CfClient, guid: String) -> Result<String> {
        client.delete_async(&resource_path(APPS, &guid)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_deserialization() {
        let json = r#"{
            "guid": "1cb006ee-fb05-47e1-b541-c34179ddc446",
            "name": "my_app",
            "state": "STOPPED",
            "created_at": "2016-03-17T21:41:30Z",
            "updated_at": "2016-03-18T11:32:30Z",
            "lifecycle": {"type": "buildpack", "data": {"buildpacks": ["java_buildpack"], "stack": "cflinuxfs4"}},
            "relationships": {"space": {"data": {"guid": "2f35885d-0c9d-4423-83ad-fd05066f8576"}}},
            "metadata": {"labels": {}, "annotations": {}},
            "links": {"self": {"href": "https://api.example.org/v3/apps/1cb006ee-fb05-47e1-b541-c34179ddc446"}}
        }"#;

        let app: App = serde_json::from_str(json).unwrap();
        assert_eq!(app.name, "my_app");
        assert_eq!(app.state, AppState::Stopped);
        assert!(!app.is_started());
        assert_eq!(app.space_guid(), Some("2f35885d-0c9d-4423-83ad-fd05066f8576"));
        assert_eq!(app.lifecycle.unwrap().lifecycle_type, "buildpack");
        assert!(app.links["self"].href.ends_with("c34179ddc446"));
    }

    #[test]
    fn test_app_minimal() {
        let app: App =
            serde_json::from_str(r#"{"guid":"g","name":"n","state":"STARTED"}"#).unwrap();
        assert!(app.is_started());
        assert_eq!(app.space_guid(), None);
    }

    #[test]
    fn test_update_skips_unset_fields() {
        let params = AppUpdate {
            name: Some("renamed".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&params).unwrap(),
            r#"{"name":"renamed"}"#
        );
    }
}
