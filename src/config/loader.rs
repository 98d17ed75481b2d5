//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

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

/// Environment variables that override file values.
pub const ENV_BACKEND_URL: &str = "EXPRESS_API_URL";
/// Accepted when `EXPRESS_API_URL` is unset.
pub const ENV_BACKEND_URL_ALIAS: &str = "BACKEND_API_URL";
pub const ENV_INTERNAL_KEY: &str = "INTERNAL_API_KEY";
pub const ENV_SESSION_URL: &str = "SESSION_URL";
pub const ENV_NOMINATIM_URL: &str = "NOMINATIM_BASE_URL";
pub const ENV_NOMINATIM_EMAIL: &str = "NOMINATIM_EMAIL";
pub const ENV_BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";

/// Parse a TOML document without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_config(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-provided values. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_BACKEND_URL).or_else(|| get(ENV_BACKEND_URL_ALIAS)) {
        config.backend.base_url = url;
    }
    if let Some(key) = get(ENV_INTERNAL_KEY) {
        config.backend.internal_key = key;
    }
    if let Some(url) = get(ENV_SESSION_URL) {
        config.session.url = Some(url);
    }
    if let Some(url) = get(ENV_NOMINATIM_URL) {
        config.geocode.base_url = url;
    }
    if let Some(email) = get(ENV_NOMINATIM_EMAIL) {
        config.geocode.email = Some(email);
    }
    if let Some(addr) = get(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "http://backend:4000"),
            (ENV_INTERNAL_KEY, "s3cret"),
            (ENV_NOMINATIM_EMAIL, ""),
        ]
        .into_iter()
        .collect();

        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.backend.base_url, "http://backend:4000");
        assert_eq!(config.backend.internal_key, "s3cret");
        assert_eq!(config.geocode.email, None);
        assert_eq!(config.session.url, None);
    }

    #[test]
    fn test_backend_url_alias() {
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |k| {
            (k == ENV_BACKEND_URL_ALIAS).then(|| "http://alias:4000".to_string())
        });
        assert_eq!(config.backend.base_url, "http://alias:4000");

        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "http://express:4000"),
            (ENV_BACKEND_URL_ALIAS, "http://alias:4000"),
        ]
        .into_iter()
        .collect();
        let mut config = GatewayConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.backend.base_url, "http://express:4000");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("listener = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/gateway.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation(vec![
            ValidationError::EmptyInternalKey,
            ValidationError::ZeroCacheCapacity,
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: backend.internal_key must not be empty, cache.geocode_capacity must be greater than zero"
        );
    }
}
