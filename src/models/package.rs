//! Package model.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::CfClient;
use crate::error::Result;
use crate::models::common::{resource_path, Links, Metadata};
use crate::traits::Get;

const PACKAGES: &str = "/v3/packages";

/// Application source bits or a docker image reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub guid: String,

    /// `bits` or `docker`.
    #[serde(rename = "type")]
    pub package_type: String,

    pub state: PackageState,

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
pub enum PackageState {
    AwaitingUpload,
    ProcessingUpload,
    Ready,
    Failed,
    Copying,
    Expired,
}

impl fmt::Display for PackageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PackageState::AwaitingUpload => "AWAITING_UPLOAD",
            PackageState::ProcessingUpload => "PROCESSING_UPLOAD",
            PackageState::Ready => "READY",
            PackageState::Failed => "FAILED",
            PackageState::Copying => "COPYING",
            PackageState::Expired => "EXPIRED",
        })
    }
}

#[async_trait]
impl Get for Package {
    type Id = String;

    async fn get(client: &CfClient, guid: String) -> Result<Self> {
        client.get(&resource_path(PACKAGES, &guid)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_state_wire_names() {
        let package: Package = serde_json::from_str(
            r#"{"guid":"p","type":"bits","state":"PROCESSING_UPLOAD"}"#,
        )
        .unwrap();
        assert_eq!(package.state, PackageState::ProcessingUpload);
        assert_eq!(package.state.to_string(), "PROCESSING_UPLOAD");
        assert_eq!(package.package_type, "bits");
    }
}
