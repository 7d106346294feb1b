//! Wrapped attribute values.
//!
//! Attribute writes arrive as a type URL plus a JSON payload, the same shape as a
//! protobuf `Any`. Before such a value is persisted it must be proven to deserialize
//! as the type the schema declares for the attribute.

use crate::error::{AttributeError, Result};
use crate::types::{AttributeType, UNDEFINED};
use crate::value::AttributeValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A dynamically typed value: the type URL names the message, the payload carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicValue {
    pub type_url: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Scalar<T> {
    value: T,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Array<T> {
    values: Vec<T>,
}

impl DynamicValue {
    /// Wrap a typed value.
    pub fn pack(value: &AttributeValue) -> Result<Self> {
        let attribute_type = value.attribute_type();
        let payload = match value {
            AttributeValue::Boolean(v) => serde_json::to_value(Scalar { value: *v })?,
            AttributeValue::BooleanArray(vs) => serde_json::to_value(Array { values: vs.clone() })?,
            AttributeValue::String(v) => serde_json::to_value(Scalar { value: v.clone() })?,
            AttributeValue::StringArray(vs) => serde_json::to_value(Array { values: vs.clone() })?,
            AttributeValue::Double(v) => serde_json::to_value(Scalar { value: *v })?,
            AttributeValue::DoubleArray(vs) => serde_json::to_value(Array { values: vs.clone() })?,
            AttributeValue::Integer(v) => serde_json::to_value(Scalar { value: *v })?,
            AttributeValue::IntegerArray(vs) => serde_json::to_value(Array { values: vs.clone() })?,
        };
        let type_url = attribute_type
            .type_url()
            .ok_or_else(|| AttributeError::InvalidArgument(attribute_type.to_string()))?;
        Ok(Self { type_url, payload })
    }

    /// Type named by the type URL, if it is one of ours.
    pub fn attribute_type(&self) -> Option<AttributeType> {
        AttributeType::from_type_url(&self.type_url)
    }

    /// Unwrap into a typed value, trusting the embedded type URL.
    pub fn unpack(&self) -> Result<AttributeValue> {
        let attribute_type = self
            .attribute_type()
            .ok_or_else(|| AttributeError::UnknownValueType(self.type_url.clone()))?;
        self.unpack_as(attribute_type)
    }

    fn unpack_as(&self, attribute_type: AttributeType) -> Result<AttributeValue> {
        let found = self.attribute_type();
        if found != Some(attribute_type) {
            return Err(AttributeError::TypeMismatch {
                expected: attribute_type.to_string(),
                found: found.map_or_else(|| self.type_url.clone(), |t| t.to_string()),
            });
        }

        let value = match attribute_type {
            AttributeType::Boolean => AttributeValue::Boolean(self.scalar()?),
            AttributeType::BooleanArray => AttributeValue::BooleanArray(self.array()?),
            AttributeType::String => AttributeValue::String(self.scalar()?),
            AttributeType::StringArray => AttributeValue::StringArray(self.array()?),
            AttributeType::Double => AttributeValue::Double(self.scalar()?),
            AttributeType::DoubleArray => AttributeValue::DoubleArray(self.array()?),
            AttributeType::Integer => AttributeValue::Integer(self.scalar()?),
            AttributeType::IntegerArray => AttributeValue::IntegerArray(self.array()?),
            AttributeType::Unspecified => {
                return Err(AttributeError::InvalidArgument(attribute_type.to_string()))
            }
        };
        Ok(value)
    }

    fn scalar<T: DeserializeOwned>(&self) -> Result<T> {
        let scalar: Scalar<T> = serde_json::from_value(self.payload.clone())?;
        Ok(scalar.value)
    }

    fn array<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let array: Array<T> = serde_json::from_value(self.payload.clone())?;
        Ok(array.values)
    }
}

impl TryFrom<&AttributeValue> for DynamicValue {
    type Error = AttributeError;

    fn try_from(value: &AttributeValue) -> Result<Self> {
        DynamicValue::pack(value)
    }
}

/// Confirm that a wrapped value deserializes as the declared type.
///
/// `Unspecified` is rejected with `InvalidArgument`; any other failure is the
/// underlying type-mismatch or deserialization error.
pub fn validate_value(value: &DynamicValue, declared: AttributeType) -> Result<()> {
    match declared {
        AttributeType::Unspecified => Err(AttributeError::InvalidArgument(format!(
            "unrecognized attribute type: {}",
            declared
        ))),
        AttributeType::Boolean
        | AttributeType::BooleanArray
        | AttributeType::String
        | AttributeType::StringArray
        | AttributeType::Double
        | AttributeType::DoubleArray
        | AttributeType::Integer
        | AttributeType::IntegerArray => value.unpack_as(declared).map(|_| ()),
    }
}

/// Type tag for a type URL, empty when the URL is not recognised.
pub fn type_url_to_string(url: &str) -> &'static str {
    AttributeType::from_type_url(url).map_or("", |t| t.as_tag())
}

/// Type tag for a declared type, `undefined` for `Unspecified`.
pub fn type_to_string(attribute_type: AttributeType) -> &'static str {
    attribute_type.as_tag()
}

/// Display form of a wrapped value's payload.
///
/// Never fails: an unknown type URL or an undecodable payload renders as `undefined`.
pub fn any_to_string(value: &DynamicValue) -> String {
    match value.unpack() {
        Ok(v) => v.payload(),
        Err(_) => UNDEFINED.to_string(),
    }
}
