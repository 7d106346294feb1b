//! Canonical textual form of attributes.
//!
//! `<entityType>:<entityID>$<attributeName>|<typeTag>:<value>`
//!
//! The format is durable: it is written to tuple storage and bundle files, so the
//! delimiters and the type-tag vocabulary must not change.

use crate::error::{AttributeError, Result};
use crate::models::{Attribute, Entity};
use crate::types::AttributeType;
use crate::value::AttributeValue;
use tracing::debug;

const VALUE_DELIMITER: char = '|';
const ATTRIBUTE_DELIMITER: char = '$';
const PAIR_DELIMITER: char = ':';

/// Encode an attribute into its canonical string.
pub fn encode(attribute: &Attribute) -> String {
    format!(
        "{}{}{}{}{}",
        entity_to_string(&attribute.entity),
        ATTRIBUTE_DELIMITER,
        attribute.attribute,
        VALUE_DELIMITER,
        attribute.value
    )
}

/// Render an entity as `type:id`.
pub fn entity_to_string(entity: &Entity) -> String {
    entity.to_string()
}

/// Decode a canonical attribute string.
///
/// Surrounding whitespace is ignored. Each structural split must yield exactly two parts.
pub fn decode(input: &str) -> Result<Attribute> {
    let input = input.trim();

    let (subject, typed_value) = split_pair(input, VALUE_DELIMITER)
        .ok_or_else(|| AttributeError::MalformedAttribute(input.to_string()))?;

    let (entity, attribute) = split_pair(subject, ATTRIBUTE_DELIMITER)
        .ok_or_else(|| AttributeError::MalformedEntity(subject.to_string()))?;

    let (entity_type, entity_id) = split_pair(entity, PAIR_DELIMITER)
        .ok_or_else(|| AttributeError::MalformedEntity(entity.to_string()))?;

    let (type_tag, payload) = split_pair(typed_value, PAIR_DELIMITER)
        .ok_or_else(|| AttributeError::MalformedAttribute(typed_value.to_string()))?;

    let attribute_type = AttributeType::from_tag(type_tag)
        .ok_or_else(|| AttributeError::UnknownValueType(type_tag.to_string()))?;

    let value = AttributeValue::parse(attribute_type, payload)?;

    debug!(entity_type, attribute, %attribute_type, "decoded attribute");

    Ok(Attribute {
        entity: Entity::new(entity_type, entity_id),
        attribute: attribute.to_string(),
        value,
    })
}

/// Split on a delimiter that must occur exactly once.
fn split_pair(s: &str, delimiter: char) -> Option<(&str, &str)> {
    let parts: Vec<&str> = s.split(delimiter).collect();
    match parts.as_slice() {
        [left, right] => Some((*left, *right)),
        _ => None,
    }
}
