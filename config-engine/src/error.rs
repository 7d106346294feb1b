use error_common::{Coded, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(String),

    #[error("Unknown database engine: {0}")]
    UnknownEngine(String),

    #[error("Logging initialisation failed: {0}")]
    Logging(String),
}

impl Coded for ConfigError {
    fn code(&self) -> ErrorCode {
        ErrorCode::Configuration
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
