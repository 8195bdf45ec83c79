use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{VsmError, VsmResult};

/// Identifier of a server-side resource.
///
/// The service is not consistent about id types, so both JSON strings and
/// integers are accepted and written back as they came.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Int(id) => write!(f, "{id}"),
            ResourceId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(id: i64) -> Self {
        ResourceId::Int(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        ResourceId::Text(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        ResourceId::Text(id)
    }
}

impl ResourceId {
    /// Compares against a raw JSON value the way a caller would write it in
    /// find criteria: `7` and `"7"` both match id 7.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (ResourceId::Int(id), Value::Number(n)) => n.as_i64() == Some(*id),
            (ResourceId::Int(id), Value::String(s)) => s.parse::<i64>().ok() == Some(*id),
            (ResourceId::Text(id), Value::String(s)) => id == s,
            (ResourceId::Text(id), Value::Number(n)) => *id == n.to_string(),
            _ => false,
        }
    }
}

/// A decoded resource: its id plus every other field as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Addresses a single member of a resource collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Collection segment, e.g. `performance_metrics`.
    pub collection: &'static str,
    /// Envelope key used for request bodies that carry one member.
    pub member_key: &'static str,
    pub id: ResourceId,
}

impl ResourceRef {
    pub fn new(collection: &'static str, member_key: &'static str, id: ResourceId) -> Self {
        Self {
            collection,
            member_key,
            id,
        }
    }

    /// The id as a single, not yet percent-encoded, path segment.
    ///
    /// Empty and dot-segment ids are rejected: a URL parser folds them into
    /// the collection or its parent, so they can never name this member.
    pub fn id_segment(&self) -> VsmResult<String> {
        let segment = self.id.to_string();
        if matches!(segment.as_str(), "" | "." | "..") {
            return Err(VsmError::Encoding {
                key: "id".to_string(),
                message: format!("'{segment}' cannot address a single resource"),
            });
        }
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_decodes_integer_and_string_ids() {
        let numeric: Resource =
            serde_json::from_value(json!({"id": 12, "io_name": "sda"})).unwrap();
        assert_eq!(numeric.id, ResourceId::Int(12));
        assert_eq!(numeric.attributes["io_name"], json!("sda"));
        assert!(!numeric.attributes.contains_key("id"));

        let text: Resource =
            serde_json::from_value(json!({"id": "a1b2", "value": 3.5})).unwrap();
        assert_eq!(text.id, ResourceId::Text("a1b2".to_string()));
    }

    #[test]
    fn test_resource_without_id_is_rejected() {
        let result: Result<Resource, _> = serde_json::from_value(json!({"value": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_id_segment() {
        let target =
            |id: ResourceId| ResourceRef::new("performance_metrics", "performance_metric", id);

        assert_eq!(target(ResourceId::Int(42)).id_segment().unwrap(), "42");
        assert_eq!(target(ResourceId::from("a/b?c")).id_segment().unwrap(), "a/b?c");

        for id in ["", ".", ".."] {
            let err = target(ResourceId::from(id)).id_segment().unwrap_err();
            assert!(matches!(err, VsmError::Encoding { ref key, .. } if key == "id"));
        }
    }

    #[test]
    fn test_resource_id_matches_loosely() {
        let id = ResourceId::Int(7);
        assert!(id.matches(&json!(7)));
        assert!(id.matches(&json!("7")));
        assert!(!id.matches(&json!(8)));
        assert!(!id.matches(&json!(null)));

        let id = ResourceId::from("7");
        assert!(id.matches(&json!(7)));
        assert!(id.matches(&json!("7")));
    }
}
