use crate::config::{Config, SCHEMA_VERSION};
use crate::error::{Result, ValidationError, VigilError};

/// Longest quiet period that still feels interactive
const MAX_DEBOUNCE_MS: u64 = 10_000;

const SOURCE_KINDS: [&str; 2] = ["fixtures", "http"];

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_search(config, &mut errors);
        Self::validate_source(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(VigilError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_search(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.search.debounce_ms > MAX_DEBOUNCE_MS {
            errors.push(ValidationError::new(
                "search.debounce_ms",
                format!(
                    "Debounce must be at most {}ms, got {}ms",
                    MAX_DEBOUNCE_MS, config.search.debounce_ms
                ),
            ));
        }

        if config.search.event_fetch_limit == 0 {
            errors.push(ValidationError::new(
                "search.event_fetch_limit",
                "Event fetch limit must be greater than 0",
            ));
        }

        if config.search.max_displayed == 0 {
            errors.push(ValidationError::new(
                "search.max_displayed",
                "Max displayed must be greater than 0",
            ));
        }
    }

    fn validate_source(config: &Config, errors: &mut Vec<ValidationError>) {
        let kind = config.source.kind.as_str();
        if !SOURCE_KINDS.contains(&kind) {
            errors.push(ValidationError::new(
                "source.kind",
                format!("Kind must be one of {:?}, got '{}'", SOURCE_KINDS, kind),
            ));
        }

        // Only the settings of the selected kind have to be usable
        if kind == "fixtures" && config.source.fixtures_dir.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "source.fixtures_dir",
                "Fixtures directory cannot be empty",
            ));
        }

        if kind == "http" {
            if let Err(e) = url::Url::parse(&config.source.base_url) {
                errors.push(ValidationError::new(
                    "source.base_url",
                    format!("Invalid base URL '{}': {}", config.source.base_url, e),
                ));
            }

            if config.source.timeout_secs == 0 {
                errors.push(ValidationError::new(
                    "source.timeout_secs",
                    "Timeout must be greater than 0",
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_kind() {
        let mut config = Config::default();
        config.source.kind = "graphql".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_http_requires_parsable_url() {
        let mut config = Config::default();
        config.source.kind = "http".to_string();
        config.source.base_url = "localhost without scheme".to_string();
        assert!(ConfigValidator::validate(&config).is_err());

        config.source.base_url = "https://backend.internal/api".to_string();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = Config::default();
        config.search.event_fetch_limit = 0;
        config.search.max_displayed = 0;
        config.search.debounce_ms = 60_000;
        config.source.fixtures_dir = PathBuf::new();

        match ConfigValidator::validate(&config) {
            Err(VigilError::ConfigValidation { errors }) => assert_eq!(errors.len(), 4),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}
