//! Fields shared by most resources.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pagination::Link;

/// Labels and annotations attached to a resource.
///
/// A `None` value is sent as JSON `null`, which removes the key on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub labels: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub annotations: BTreeMap<String, Option<String>>,
}

impl Metadata {
    /// Value of a label, if set.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).and_then(|v| v.as_deref())
    }
}

/// A reference to another resource by guid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidRef {
    pub guid: String,
}

/// A to-one relationship. `data` is `null` when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToOneRelationship {
    #[serde(default)]
    pub data: Option<GuidRef>,
}

impl ToOneRelationship {
    pub fn to(guid: impl Into<String>) -> Self {
        Self {
            data: Some(GuidRef { guid: guid.into() }),
        }
    }

    /// The related guid, if the relationship is set.
    pub fn guid(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.guid.as_str())
    }
}

/// Named hypermedia links (`self`, `space`, `packages`, ...).
pub type Links = BTreeMap<String, Link>;

/// Path of a single resource under `collection`, with the guid escaped.
pub(crate) fn resource_path(collection: &str, guid: &str) -> String {
    format!("{}/{}", collection, urlencoding::encode(guid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_null_label() {
        let metadata: Metadata = serde_json::from_str(
            r#"{"labels":{"env":"prod","stale":null},"annotations":{}}"#,
        )
        .unwrap();
        assert_eq!(metadata.label("env"), Some("prod"));
        assert_eq!(metadata.label("stale"), None);
        assert!(metadata.labels.contains_key("stale"));
    }

    #[test]
    fn test_relationship_null_data() {
        let rel: ToOneRelationship = serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert_eq!(rel.guid(), None);
        assert_eq!(ToOneRelationship::to("abc").guid(), Some("abc"));
    }

    #[test]
    fn test_resource_path_escapes_guid() {
        assert_eq!(resource_path("/v3/apps", "a b"), "/v3/apps/a%20b");
    }
}
