//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::FanoutConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<FanoutConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: FanoutConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[dispatch]\nmax_in_flight = 4\n\n[timeouts]\ncall_ms = 250"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.dispatch.max_in_flight, 4);
        assert_eq!(config.timeouts.call_ms, 250);
    }

    #[test]
    fn test_validation_errors_are_reported_together() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[dispatch]\nmax_in_flight = 0\n\n[downstream]\nurl = \"not a url\""
        )
        .unwrap();

        let err = load_config(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "), "{message}");
        assert!(message.contains("downstream.url"), "{message}");
        assert!(message.contains("dispatch.max_in_flight"), "{message}");
    }

    #[test]
    fn test_example_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/fanout.example.toml");
        let config = load_config(&path).unwrap();
        assert_eq!(config.downstream.url, "http://blogcount/");
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
