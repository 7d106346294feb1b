use crate::error::Result;
use crate::settings::StoreSettings;
use crate::validation::validate;
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

pub const DEFAULT_ENV_PREFIX: &str = "REBAC";

/// Loads [`StoreSettings`] from defaults, an optional file and the environment, in
/// that order of precedence (later wins).
///
/// Environment keys use `__` between levels: `REBAC__PAGINATION__MAX_PAGE_SIZE=50`.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Settings file, format picked from the extension. A missing file is skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    pub fn load(&self) -> Result<StoreSettings> {
        let defaults = StoreSettings::default();
        let mut builder = Config::builder()
            .set_default("engine", defaults.engine.as_str())?
            .set_default(
                "pagination.default_page_size",
                u64::from(defaults.pagination.default_page_size),
            )?
            .set_default(
                "pagination.max_page_size",
                u64::from(defaults.pagination.max_page_size),
            )?
            .set_default("logging.level", defaults.logging.level.clone())?
            .set_default("logging.format", defaults.logging.format.to_string())?;

        if let Some(ref path) = self.file {
            tracing::debug!(path = %path.display(), "adding settings file");
            builder = builder.add_source(File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let settings: StoreSettings = builder.build()?.try_deserialize()?;
        validate(&settings)?;

        tracing::debug!(engine = %settings.engine, "settings loaded");
        Ok(settings)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
