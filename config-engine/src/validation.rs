// Settings checks applied after every load
use crate::error::{ConfigError, Result};
use crate::settings::StoreSettings;

pub fn validate(settings: &StoreSettings) -> Result<()> {
    let pagination = &settings.pagination;
    if pagination.default_page_size == 0 {
        return Err(ConfigError::Validation(
            "pagination.default_page_size must be at least 1".to_string(),
        ));
    }
    if pagination.default_page_size > pagination.max_page_size {
        return Err(ConfigError::Validation(format!(
            "pagination.default_page_size ({}) exceeds pagination.max_page_size ({})",
            pagination.default_page_size, pagination.max_page_size
        )));
    }
    if settings.logging.level.trim().is_empty() {
        return Err(ConfigError::Validation("logging.level must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&StoreSettings::default()).is_ok());
    }

    #[test]
    fn test_page_size_bounds() {
        let mut settings = StoreSettings::default();
        settings.pagination.default_page_size = 0;
        assert!(matches!(validate(&settings), Err(ConfigError::Validation(_))));

        settings.pagination.default_page_size = 101;
        assert!(matches!(validate(&settings), Err(ConfigError::Validation(_))));
    }
}
