//! Space model and trait implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::CfClient;
use crate::error::Result;
use crate::models::common::{resource_path, Links, Metadata, ToOneRelationship};
use crate::pagination::ListOptions;
use crate::traits::{Get, List};

const SPACES: &str = "/v3/spaces";

/// A space within an organization. Apps are deployed into spaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub guid: String,
    pub name: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub relationships: SpaceRelationships,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpaceRelationships {
    #[serde(default)]
    pub organization: ToOneRelationship,
    #[serde(default)]
    pub quota: ToOneRelationship,
}

impl Space {
    pub fn organization_guid(&self) -> Option<&str> {
        self.relationships.organization.guid()
    }

    /// All spaces of one organization.
    pub async fn list_in_organization(client: &CfClient, org_guid: &str) -> Result<Vec<Self>> {
        let options = ListOptions::new().filter("organization_guids", org_guid);
        <Self as List>::list_all(client, &options).await
    }
}

#[async_trait]
impl Get for Space {
    type Id = String;

    #[tracing::instrument(skip(client))]
    async fn get(client: &CfClient, guid: String) -> Result<Self> {
        client.get(&resource_path(SPACES, &guid)).await
    }
}

impl List for Space {
    const PATH: &'static str = SPACES;
}
