use crate::codec;
use crate::error::AttributeError;
use crate::value::AttributeValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An entity instance an attribute is attached to, e.g. `document:1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: String,
    pub id: String,
}

impl Entity {
    pub fn new(entity_type: &str, id: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

/// A typed value bound to an entity under an attribute name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub entity: Entity,
    pub attribute: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(entity: Entity, attribute: &str, value: impl Into<AttributeValue>) -> Self {
        Self {
            entity,
            attribute: attribute.to_string(),
            value: value.into(),
        }
    }
}

/// Renders the canonical attribute string.
impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::encode(self))
    }
}

impl FromStr for Attribute {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        codec::decode(s)
    }
}
