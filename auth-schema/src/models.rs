use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One persisted schema construct: a single entity or rule definition of one version.
///
/// Identity is `(tenant_id, name, version)`. Rows are never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaDefinitionRow {
    pub tenant_id: String,
    pub name: String,
    pub version: String,
    pub serialized_definition: String,
}

impl SchemaDefinitionRow {
    pub fn new(tenant_id: &str, version: &str, construct: SchemaConstruct) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            name: construct.name,
            version: version.to_string(),
            serialized_definition: construct.serialized_definition,
        }
    }
}

impl fmt::Display for SchemaDefinitionRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.tenant_id, self.name, self.version)
    }
}

/// A named construct submitted to a schema write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConstruct {
    pub name: String,
    pub serialized_definition: String,
}

impl SchemaConstruct {
    pub fn new(name: &str, serialized_definition: &str) -> Self {
        Self {
            name: name.to_string(),
            serialized_definition: serialized_definition.to_string(),
        }
    }
}

/// A listed schema version with the creation time decoded from the version itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaListEntry {
    pub version: String,
    pub created_at: DateTime<Utc>,
}
