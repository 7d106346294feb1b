//! Versioned schema store for the Zanzibar-style authorization engine
//!
//! Authorization schemas are written as immutable, per-tenant versions. Each version
//! is stored as one row per top-level construct (entity or rule) and every tenant has
//! a head pointer naming its most recent version. This crate provides:
//! - Snapshot-isolated reads of whole schemas and single constructs
//! - Atomic multi-row writes with a monotonic head version
//! - Paginated listing of versions with opaque continuation tokens
//! - ULID version identifiers whose text order is creation order
//! - The schema compiler boundary and a reference compiler
//!
//! # Core Concepts
//!
//! - **Tenant**: isolation boundary, all schema state is partitioned per tenant
//! - **Construct**: a named entity or rule definition
//! - **Version**: sortable, time-embedding identifier of one immutable snapshot
//! - **Head version**: the most recently committed version of a tenant
//!
//! # Example
//!
//! ```rust
//! use auth_schema::{DefinitionCompiler, MemorySchemaStore, SchemaService};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), auth_schema::SchemaError> {
//! let compiler = Arc::new(DefinitionCompiler::new());
//! let store = Arc::new(MemorySchemaStore::new(compiler.clone()));
//! let service = SchemaService::new(store, compiler);
//! let cancel = CancellationToken::new();
//!
//! let version = service
//!     .write_schema(&cancel, "t1", "entity user {}\nentity doc { relation owner: user }")
//!     .await?;
//!
//! let (doc, resolved) = service
//!     .read_entity_definition(&cancel, "t1", "doc", None)
//!     .await?;
//! assert_eq!(resolved, version);
//! assert!(doc.relation("owner").is_some());
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod engine;
pub mod error;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod schema;
pub mod version;

pub use compiler::DefinitionCompiler;
pub use engine::SchemaService;
pub use error::{Result, SchemaError};
pub use models::*;
pub use pagination::{ContinuationToken, EncodedContinuationToken, Pagination, DEFAULT_PAGE_SIZE};
pub use repository::{build_store, MemorySchemaStore, SchemaReader, SchemaStore, SchemaWriter};
pub use schema::*;
pub use version::{creation_time, new_version, VersionGenerator};
