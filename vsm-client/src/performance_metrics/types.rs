use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transport::{Resource, ResourceId};

/// A performance metric sample as returned by the service.
///
/// Apart from `id` the record is opaque: its fields depend on the endpoint
/// and the service version, so they are exposed as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricRecord(Resource);

impl MetricRecord {
    pub fn id(&self) -> &ResourceId {
        &self.0.id
    }

    /// Look up a single field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.attributes.get(field)
    }

    /// All fields except `id`.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.0.attributes
    }

    /// Whether every criterion equals the record's field of the same name.
    /// The key `id` is compared against the record id.
    pub fn matches(&self, criteria: &Map<String, Value>) -> bool {
        criteria.iter().all(|(field, expected)| {
            if field == "id" {
                self.0.id.matches(expected)
            } else {
                self.get(field) == Some(expected)
            }
        })
    }
}

impl From<Resource> for MetricRecord {
    fn from(resource: Resource) -> Self {
        Self(resource)
    }
}

impl fmt::Display for MetricRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<PerformanceMetrics: {}>", self.0.id)
    }
}
