//! Schema version identifiers.
//!
//! Versions are ULIDs: 48 bits of millisecond timestamp followed by 80 random bits,
//! rendered as 26 Crockford base32 characters. String order is creation order, which
//! lets the store find the newest version and list versions chronologically with
//! plain index scans.

use crate::error::{Result, SchemaError};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::OnceLock;
use ulid::{Generator, Ulid};

/// Mints strictly increasing version identifiers.
///
/// Within one millisecond the random part is incremented instead of redrawn, so two
/// versions minted back to back still sort in minting order.
pub struct VersionGenerator {
    inner: Mutex<Generator>,
}

impl VersionGenerator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Generator::new()),
        }
    }

    /// Process-wide generator.
    pub fn global() -> &'static VersionGenerator {
        static GENERATOR: OnceLock<VersionGenerator> = OnceLock::new();
        GENERATOR.get_or_init(VersionGenerator::new)
    }

    pub fn next_version(&self) -> Result<String> {
        let id = self
            .inner
            .lock()
            .generate()
            .map_err(|e| SchemaError::InternalError(anyhow::anyhow!("version generator: {}", e)))?;
        Ok(id.to_string())
    }
}

impl Default for VersionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Mint a new version from the process-wide generator.
pub fn new_version() -> Result<String> {
    VersionGenerator::global().next_version()
}

/// Decode the creation time embedded in a version.
pub fn creation_time(version: &str) -> Result<DateTime<Utc>> {
    let id = Ulid::from_string(version).map_err(|e| {
        SchemaError::InternalError(anyhow::anyhow!("undecodable version {:?}: {}", version, e))
    })?;
    let millis = i64::try_from(id.timestamp_ms()).map_err(|e| {
        SchemaError::InternalError(anyhow::anyhow!("version {:?} out of range: {}", version, e))
    })?;
    Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
        SchemaError::InternalError(anyhow::anyhow!("version {:?} has no valid timestamp", version))
    })
}
