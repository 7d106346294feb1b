// Error codes shared by every crate in the workspace.
// The string forms are part of the external contract: API layers return them verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod schema {
    pub const SCHEMA_NOT_FOUND: &str = "ERROR_CODE_SCHEMA_NOT_FOUND";
    pub const CONFLICT: &str = "ERROR_CODE_CONFLICT";
    pub const COMPILE: &str = "ERROR_CODE_SCHEMA_COMPILE";
    pub const INVALID_CONTINUATION_TOKEN: &str = "ERROR_CODE_INVALID_CONTINUOUS_TOKEN";
}

pub mod attribute {
    pub const MALFORMED_ATTRIBUTE: &str = "ERROR_CODE_INVALID_ATTRIBUTE";
    pub const MALFORMED_ENTITY: &str = "ERROR_CODE_INVALID_ENTITY";
    pub const UNKNOWN_VALUE_TYPE: &str = "ERROR_CODE_INVALID_VALUE_TYPE";
    pub const VALUE_PARSE: &str = "ERROR_CODE_VALUE_PARSE";
}

pub mod validation {
    pub const INVALID_ARGUMENT: &str = "ERROR_CODE_INVALID_ARGUMENT";
    pub const TYPE_MISMATCH: &str = "ERROR_CODE_TYPE_CONVERSATION";
}

pub mod system {
    pub const EXECUTION: &str = "ERROR_CODE_EXECUTION";
    pub const INTERNAL: &str = "ERROR_CODE_INTERNAL";
    pub const CANCELLED: &str = "ERROR_CODE_CANCELLED";
    pub const CONFIGURATION: &str = "ERROR_CODE_CONFIGURATION";
}

/// Error kinds surfaced by the schema store, the attribute codec and their collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    SchemaNotFound,
    Conflict,
    Compile,
    InvalidContinuationToken,
    MalformedAttribute,
    MalformedEntity,
    UnknownValueType,
    ValueParse,
    InvalidArgument,
    TypeMismatch,
    Execution,
    Internal,
    Cancelled,
    Configuration,
}

impl ErrorCode {
    /// Stable wire string for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SchemaNotFound => schema::SCHEMA_NOT_FOUND,
            ErrorCode::Conflict => schema::CONFLICT,
            ErrorCode::Compile => schema::COMPILE,
            ErrorCode::InvalidContinuationToken => schema::INVALID_CONTINUATION_TOKEN,
            ErrorCode::MalformedAttribute => attribute::MALFORMED_ATTRIBUTE,
            ErrorCode::MalformedEntity => attribute::MALFORMED_ENTITY,
            ErrorCode::UnknownValueType => attribute::UNKNOWN_VALUE_TYPE,
            ErrorCode::ValueParse => attribute::VALUE_PARSE,
            ErrorCode::InvalidArgument => validation::INVALID_ARGUMENT,
            ErrorCode::TypeMismatch => validation::TYPE_MISMATCH,
            ErrorCode::Execution => system::EXECUTION,
            ErrorCode::Internal => system::INTERNAL,
            ErrorCode::Cancelled => system::CANCELLED,
            ErrorCode::Configuration => system::CONFIGURATION,
        }
    }

    /// Whether the code points at caller input rather than a fault inside the system.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ErrorCode::Execution | ErrorCode::Internal | ErrorCode::Configuration
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
