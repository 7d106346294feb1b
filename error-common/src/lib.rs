//! Common error handling utilities for the ReBAC data layer
//!
//! Every crate in the workspace keeps its own `thiserror` enum and maps each
//! variant onto a shared [`ErrorCode`] through the [`Coded`] trait. API layers
//! translate codes into status codes; the data layer never retries on its own.
//!
//! # Error Categories
//!
//! - **Schema**: missing schema versions, write conflicts, compile failures, bad cursors
//! - **Attribute**: malformed canonical attribute strings and payloads
//! - **Validation**: unknown declared types and runtime type mismatches
//! - **System**: storage execution failures, internal faults, cancellation, configuration
//!
//! # Example
//!
//! ```rust
//! use error_common::{log_error, Coded, ErrorCode};
//!
//! #[derive(Debug)]
//! struct NotFound;
//!
//! impl std::fmt::Display for NotFound {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "schema not found")
//!     }
//! }
//!
//! impl std::error::Error for NotFound {}
//!
//! impl Coded for NotFound {
//!     fn code(&self) -> ErrorCode {
//!         ErrorCode::SchemaNotFound
//!     }
//! }
//!
//! log_error("read_schema", &NotFound);
//! assert_eq!(NotFound.code().as_str(), "ERROR_CODE_SCHEMA_NOT_FOUND");
//! ```

pub mod codes;
pub mod types;

pub use codes::*;
pub use types::*;
