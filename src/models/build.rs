//! Build model.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::CfClient;
use crate::error::Result;
use crate::models::common::{resource_path, GuidRef, Links, Metadata};
use crate::traits::Get;

const BUILDS: &str = "/v3/builds";

/// A staging run that turns a package into a droplet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub guid: String,
    pub state: BuildState,

    /// Staging failure description, set when `state` is FAILED.
    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub package: Option<GuidRef>,
    /// Set once staging succeeds.
    #[serde(default)]
    pub droplet: Option<GuidRef>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildState {
    Staging,
    Staged,
    Failed,
}

impl Build {
    pub fn droplet_guid(&self) -> Option<&str> {
        self.droplet.as_ref().map(|d| d.guid.as_str())
    }
}

#[async_trait]
impl Get for Build {
    type Id = String;

    async fn get(client: &CfClient, guid: String) -> Result<Self> {
        client.get(&resource_path(BUILDS, &guid)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_build() {
        let build: Build = serde_json::from_str(
            r#"{"guid":"b","state":"FAILED","error":"StagingError - buildpack compile failed","droplet":null}"#,
        )
        .unwrap();
        assert_eq!(build.state, BuildState::Failed);
        assert_eq!(build.droplet_guid(), None);
        assert!(build.error.unwrap().contains("compile failed"));
    }
}
