use crate::schema::CompileError;
use auth_attributes::AttributeError;
use config_engine::DatabaseEngine;
use error_common::{Coded, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema not found: tenant {tenant_id}, version {version:?}, name {name:?}")]
    SchemaNotFound {
        tenant_id: String,
        version: Option<String>,
        name: Option<String>,
    },

    #[error("Conflict: tenant {tenant_id} already has schema version {version}")]
    Conflict { tenant_id: String, version: String },

    #[error("Stale version: {version} does not sort after head {head} for tenant {tenant_id}")]
    StaleVersion {
        tenant_id: String,
        version: String,
        head: String,
    },

    #[error("Invalid continuation token: {0}")]
    InvalidContinuationToken(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error("Storage engine {0} is not available in this build")]
    UnsupportedEngine(DatabaseEngine),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl SchemaError {
    pub(crate) fn not_found(tenant_id: &str, version: Option<&str>, name: Option<&str>) -> Self {
        SchemaError::SchemaNotFound {
            tenant_id: tenant_id.to_string(),
            version: version.map(str::to_string),
            name: name.map(str::to_string),
        }
    }
}

impl Coded for SchemaError {
    fn code(&self) -> ErrorCode {
        match self {
            SchemaError::SchemaNotFound { .. } => ErrorCode::SchemaNotFound,
            SchemaError::Conflict { .. } | SchemaError::StaleVersion { .. } => ErrorCode::Conflict,
            SchemaError::InvalidContinuationToken(_) => ErrorCode::InvalidContinuationToken,
            SchemaError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            SchemaError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            SchemaError::Compile(_) => ErrorCode::Compile,
            SchemaError::Attribute(err) => err.code(),
            SchemaError::UnsupportedEngine(_) => ErrorCode::Configuration,
            SchemaError::Cancelled => ErrorCode::Cancelled,
            SchemaError::Execution(_) => ErrorCode::Execution,
            SchemaError::InternalError(_) => ErrorCode::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
