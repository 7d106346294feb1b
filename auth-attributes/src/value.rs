use crate::error::{AttributeError, Result};
use crate::types::AttributeType;
use serde::{Deserialize, Serialize};
use std::fmt;

const ELEMENT_SEPARATOR: char = ',';

/// A typed attribute value: one of four scalars or a homogeneous array of one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Boolean(bool),
    BooleanArray(Vec<bool>),
    String(String),
    StringArray(Vec<String>),
    Double(f64),
    DoubleArray(Vec<f64>),
    Integer(i32),
    IntegerArray(Vec<i32>),
}

impl AttributeValue {
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AttributeValue::Boolean(_) => AttributeType::Boolean,
            AttributeValue::BooleanArray(_) => AttributeType::BooleanArray,
            AttributeValue::String(_) => AttributeType::String,
            AttributeValue::StringArray(_) => AttributeType::StringArray,
            AttributeValue::Double(_) => AttributeType::Double,
            AttributeValue::DoubleArray(_) => AttributeType::DoubleArray,
            AttributeValue::Integer(_) => AttributeType::Integer,
            AttributeValue::IntegerArray(_) => AttributeType::IntegerArray,
        }
    }

    /// Render the payload half of the canonical form, without the type tag.
    pub fn payload(&self) -> String {
        match self {
            AttributeValue::Boolean(v) => v.to_string(),
            AttributeValue::BooleanArray(vs) => join(vs.iter().map(bool::to_string)),
            AttributeValue::String(v) => v.clone(),
            AttributeValue::StringArray(vs) => vs.join(","),
            AttributeValue::Double(v) => format_double(*v),
            AttributeValue::DoubleArray(vs) => join(vs.iter().copied().map(format_double)),
            AttributeValue::Integer(v) => v.to_string(),
            AttributeValue::IntegerArray(vs) => join(vs.iter().map(i32::to_string)),
        }
    }

    /// Parse a payload for the given type.
    ///
    /// An empty payload is the empty array for numeric and boolean arrays, and
    /// `[""]` for `string[]`.
    pub fn parse(attribute_type: AttributeType, payload: &str) -> Result<Self> {
        let value = match attribute_type {
            AttributeType::Boolean => AttributeValue::Boolean(parse_bool(payload)?),
            AttributeType::BooleanArray => {
                AttributeValue::BooleanArray(parse_elements(payload, parse_bool)?)
            }
            AttributeType::String => AttributeValue::String(payload.to_string()),
            AttributeType::StringArray => {
                AttributeValue::StringArray(
                    payload.split(ELEMENT_SEPARATOR).map(str::to_string).collect(),
                )
            }
            AttributeType::Double => AttributeValue::Double(parse_double(payload)?),
            AttributeType::DoubleArray => {
                AttributeValue::DoubleArray(parse_elements(payload, parse_double)?)
            }
            AttributeType::Integer => AttributeValue::Integer(parse_integer(payload)?),
            AttributeType::IntegerArray => {
                AttributeValue::IntegerArray(parse_elements(payload, parse_integer)?)
            }
            AttributeType::Unspecified => {
                return Err(AttributeError::UnknownValueType(attribute_type.to_string()))
            }
        };
        Ok(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.attribute_type(), self.payload())
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Boolean(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Double(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::Integer(v)
    }
}

/// Shortest text that parses back to the same double; never exponent notation.
pub(crate) fn format_double(v: f64) -> String {
    v.to_string()
}

fn join(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(",")
}

fn parse_elements<T>(payload: &str, parse: impl Fn(&str) -> Result<T>) -> Result<Vec<T>> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    payload.split(ELEMENT_SEPARATOR).map(parse).collect()
}

fn parse_bool(s: &str) -> Result<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(AttributeError::ValueParse {
            element: s.to_string(),
            target: AttributeType::Boolean,
            reason: "invalid syntax".to_string(),
        }),
    }
}

fn parse_double(s: &str) -> Result<f64> {
    s.parse::<f64>().map_err(|e| AttributeError::ValueParse {
        element: s.to_string(),
        target: AttributeType::Double,
        reason: e.to_string(),
    })
}

fn parse_integer(s: &str) -> Result<i32> {
    s.parse::<i32>().map_err(|e| AttributeError::ValueParse {
        element: s.to_string(),
        target: AttributeType::Integer,
        reason: e.to_string(),
    })
}
