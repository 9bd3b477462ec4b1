//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use chrono::{TimeZone, Utc};

use crate::{
    App, AppRelationships, AppState, Lifecycle, Metadata, Organization,
    OrganizationRelationships, Space, SpaceRelationships, ToOneRelationship,
};

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    // =========================================================================
    // App Fixtures
    // =========================================================================

    /// Create a stopped buildpack app in `space_guid`.
    pub fn app(guid: &str, name: &str, space_guid: &str) -> App {
        App {
            guid: guid.to_string(),
            name: name.to_string(),
            state: AppState::Stopped,
            created_at: Utc.with_ymd_and_hms(2024, 3, 17, 21, 41, 30).single(),
            updated_at: None,
            lifecycle: Some(Lifecycle {
                lifecycle_type: "buildpack".to_string(),
                data: serde_json::json!({"buildpacks": [], "stack": "cflinuxfs4"}),
            }),
            relationships: AppRelationships {
                space: ToOneRelationship::to(space_guid),
            },
            metadata: Metadata::default(),
            links: Default::default(),
        }
    }

    /// Create a started app.
    pub fn started_app(guid: &str, name: &str, space_guid: &str) -> App {
        App {
            state: AppState::Started,
            ..Self::app(guid, name, space_guid)
        }
    }

    // =========================================================================
    // Organization and Space Fixtures
    // =========================================================================

    pub fn organization(guid: &str, name: &str) -> Organization {
        Organization {
            guid: guid.to_string(),
            name: name.to_string(),
            suspended: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single(),
            updated_at: None,
            relationships: OrganizationRelationships::default(),
            metadata: Metadata::default(),
            links: Default::default(),
        }
    }

    pub fn space(guid: &str, name: &str, org_guid: &str) -> Space {
        Space {
            guid: guid.to_string(),
            name: name.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).single(),
            updated_at: None,
            relationships: SpaceRelationships {
                organization: ToOneRelationship::to(org_guid),
                quota: ToOneRelationship::default(),
            },
            metadata: Metadata::default(),
            links: Default::default(),
        }
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    /// Create the default scenario: one org, two spaces, five apps.
    pub fn default_scenario() -> DefaultScenario {
        DefaultScenario::new()
    }
}

/// A complete test scenario with related data.
pub struct DefaultScenario {
    pub organizations: Vec<Organization>,
    pub spaces: Vec<Space>,
    pub apps: Vec<App>,
}

impl DefaultScenario {
    fn new() -> Self {
        let organizations = vec![Fixtures::organization("org-1", "acme")];

        let spaces = vec![
            Fixtures::space("space-1", "production", "org-1"),
            Fixtures::space("space-2", "staging", "org-1"),
        ];

        let apps = vec![
            Fixtures::started_app("app-1", "frontend", "space-1"),
            Fixtures::started_app("app-2", "backend", "space-1"),
            Fixtures::app("app-3", "worker", "space-1"),
            Fixtures::started_app("app-4", "frontend", "space-2"),
            Fixtures::app("app-5", "migrations", "space-2"),
        ];

        Self {
            organizations,
            spaces,
            apps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_fixture() {
        let app = Fixtures::app("app-1", "web", "space-1");
        assert_eq!(app.space_guid(), Some("space-1"));
        assert!(!app.is_started());
        assert!(Fixtures::started_app("a", "b", "c").is_started());
    }

    #[test]
    fn test_default_scenario() {
        let scenario = Fixtures::default_scenario();
        assert_eq!(scenario.organizations.len(), 1);
        assert_eq!(scenario.spaces.len(), 2);
        assert_eq!(scenario.apps.len(), 5);
        assert!(scenario
            .spaces
            .iter()
            .all(|s| s.organization_guid() == Some("org-1")));
    }
}
