use crate::types::AttributeType;
use error_common::{Coded, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttributeError {
    #[error("Malformed attribute segment: {0}")]
    MalformedAttribute(String),

    #[error("Malformed entity segment: {0}")]
    MalformedEntity(String),

    #[error("Unknown value type: {0}")]
    UnknownValueType(String),

    #[error("Failed to parse {element:?} as {target}: {reason}")]
    ValueParse {
        element: String,
        target: AttributeType,
        reason: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Payload deserialization failed: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl Coded for AttributeError {
    fn code(&self) -> ErrorCode {
        match self {
            AttributeError::MalformedAttribute(_) => ErrorCode::MalformedAttribute,
            AttributeError::MalformedEntity(_) => ErrorCode::MalformedEntity,
            AttributeError::UnknownValueType(_) => ErrorCode::UnknownValueType,
            AttributeError::ValueParse { .. } => ErrorCode::ValueParse,
            AttributeError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            AttributeError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            AttributeError::Deserialization(_) => ErrorCode::TypeMismatch,
        }
    }
}

pub type Result<T> = std::result::Result<T, AttributeError>;
