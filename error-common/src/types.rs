use crate::codes::ErrorCode;

/// Implemented by every domain error so callers can map failures onto the shared taxonomy.
pub trait Coded: std::error::Error {
    fn code(&self) -> ErrorCode;
}

/// Log an error once, with its code attached as a structured field.
pub fn log_error<E: Coded + ?Sized>(context: &str, error: &E) {
    let code = error.code();
    if code.is_client_error() {
        tracing::warn!(
            context = context,
            error_code = %code,
            error = %error,
            "request rejected"
        );
    } else {
        tracing::error!(
            context = context,
            error_code = %code,
            error = %error,
            "operation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Missing;

    impl fmt::Display for Missing {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "missing")
        }
    }

    impl std::error::Error for Missing {}

    impl Coded for Missing {
        fn code(&self) -> ErrorCode {
            ErrorCode::SchemaNotFound
        }
    }

    #[test]
    fn test_wire_strings() {
        assert_eq!(ErrorCode::SchemaNotFound.to_string(), "ERROR_CODE_SCHEMA_NOT_FOUND");
        assert_eq!(ErrorCode::InvalidArgument.as_str(), "ERROR_CODE_INVALID_ARGUMENT");
        assert_eq!(ErrorCode::Execution.as_str(), "ERROR_CODE_EXECUTION");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(ErrorCode::Conflict.is_client_error());
        assert!(ErrorCode::MalformedEntity.is_client_error());
        assert!(!ErrorCode::Internal.is_client_error());
        assert!(!ErrorCode::Execution.is_client_error());
    }

    #[test]
    fn test_log_error_accepts_trait_objects() {
        let err: Box<dyn Coded> = Box::new(Missing);
        assert_eq!(err.code(), ErrorCode::SchemaNotFound);
        log_error("lookup", err.as_ref());
    }
}
