//! Configuration for the ReBAC schema data layer
//!
//! Settings are layered, later sources winning:
//! - Built-in defaults
//! - An optional settings file (YAML, TOML or JSON, chosen by extension)
//! - Environment variables under a prefix, `REBAC__SECTION__KEY`
//!
//! Loaded settings are validated before they are returned. This crate also owns
//! tracing initialisation so every binary logs the same way.
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::{logging, ConfigLoader};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = ConfigLoader::new()
//!         .with_file("rebac.yaml")
//!         .with_env_prefix("REBAC")
//!         .load()?;
//!
//!     logging::init_tracing(&settings.logging)?;
//!     tracing::info!(engine = %settings.engine, "settings loaded");
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod loader;
pub mod logging;
pub mod settings;
pub mod validation;

pub use engine::DatabaseEngine;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use settings::*;
