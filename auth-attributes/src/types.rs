use crate::error::AttributeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix shared by the type URLs of wrapped attribute values.
pub const TYPE_URL_PREFIX: &str = "type.zanzibar.dev/attribute.v1.";

/// Rendering used when a type or value cannot be described.
pub const UNDEFINED: &str = "undefined";

/// Declared type of an attribute.
///
/// `Unspecified` mirrors the zero value of the wire enum: it can be declared by a
/// client that never set the field, but no value ever has this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Unspecified,
    Boolean,
    BooleanArray,
    String,
    StringArray,
    Double,
    DoubleArray,
    Integer,
    IntegerArray,
}

impl AttributeType {
    /// Every type a value can actually carry.
    pub const ALL: [AttributeType; 8] = [
        AttributeType::Boolean,
        AttributeType::BooleanArray,
        AttributeType::String,
        AttributeType::StringArray,
        AttributeType::Double,
        AttributeType::DoubleArray,
        AttributeType::Integer,
        AttributeType::IntegerArray,
    ];

    /// Type tag used in the canonical attribute string, `undefined` for `Unspecified`.
    pub fn as_tag(&self) -> &'static str {
        match self {
            AttributeType::Unspecified => UNDEFINED,
            AttributeType::Boolean => "boolean",
            AttributeType::BooleanArray => "boolean[]",
            AttributeType::String => "string",
            AttributeType::StringArray => "string[]",
            AttributeType::Double => "double",
            AttributeType::DoubleArray => "double[]",
            AttributeType::Integer => "integer",
            AttributeType::IntegerArray => "integer[]",
        }
    }

    /// Parse a type tag. Only the eight concrete tags are accepted.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "boolean" => Some(AttributeType::Boolean),
            "boolean[]" => Some(AttributeType::BooleanArray),
            "string" => Some(AttributeType::String),
            "string[]" => Some(AttributeType::StringArray),
            "double" => Some(AttributeType::Double),
            "double[]" => Some(AttributeType::DoubleArray),
            "integer" => Some(AttributeType::Integer),
            "integer[]" => Some(AttributeType::IntegerArray),
            _ => None,
        }
    }

    /// Message name carried in the type URL of a wrapped value.
    pub fn message_name(&self) -> Option<&'static str> {
        match self {
            AttributeType::Unspecified => None,
            AttributeType::Boolean => Some("Boolean"),
            AttributeType::BooleanArray => Some("BooleanArray"),
            AttributeType::String => Some("String"),
            AttributeType::StringArray => Some("StringArray"),
            AttributeType::Double => Some("Double"),
            AttributeType::DoubleArray => Some("DoubleArray"),
            AttributeType::Integer => Some("Integer"),
            AttributeType::IntegerArray => Some("IntegerArray"),
        }
    }

    /// Full type URL for wrapped values of this type.
    pub fn type_url(&self) -> Option<String> {
        self.message_name()
            .map(|name| format!("{}{}", TYPE_URL_PREFIX, name))
    }

    /// Resolve a type URL back into a type.
    pub fn from_type_url(url: &str) -> Option<Self> {
        let name = url.strip_prefix(TYPE_URL_PREFIX)?;
        Self::ALL
            .into_iter()
            .find(|t| t.message_name() == Some(name))
    }

}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for AttributeType {
    type Err = AttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| AttributeError::UnknownValueType(s.to_string()))
    }
}
