//! Organization model and trait implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::CfClient;
use crate::error::Result;
use crate::models::common::{resource_path, Links, Metadata, ToOneRelationship};
use crate::traits::{Get, List};

const ORGANIZATIONS: &str = "/v3/organizations";

/// An organization, the top-level tenant that owns spaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub guid: String,
    pub name: String,

    /// Suspended orgs are read-only for non-admins.
    #[serde(default)]
    pub suspended: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub relationships: OrganizationRelationships,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationRelationships {
    #[serde(default)]
    pub quota: ToOneRelationship,
}

#[async_trait]
impl Get for Organization {
    type Id = String;

    #[tracing::instrument(skip(client))]
    async fn get(client: &CfClient, guid: String) -> Result<Self> {
        client.get(&resource_path(ORGANIZATIONS, &guid)).await
    }
}

impl List for Organization {
    const PATH: &'static str = ORGANIZATIONS;
}
