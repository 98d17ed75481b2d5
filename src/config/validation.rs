//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs, addresses and value ranges
//! - Detect duplicate rate-limit scopes and prefixes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, RoutePolicy};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backend.internal_key must not be empty")]
    EmptyInternalKey,

    #[error("backend.internal_key contains characters not allowed in a header")]
    InvalidInternalKey,

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("rate limit scope must not be empty")]
    EmptyScope,

    #[error("rate limit scope '{0}' has a zero window")]
    ZeroWindow(String),

    #[error("rate limit scope '{0}' allows zero requests")]
    ZeroLimit(String),

    #[error("rate limit scope '{0}' is defined more than once")]
    DuplicateScope(String),

    #[error("rate limit route '{0}' needs a path_prefix starting with '/'")]
    InvalidPrefix(String),

    #[error("rate limit path prefix '{0}' is used by more than one route")]
    DuplicatePrefix(String),

    #[error("rate_limit.sweep_interval_secs must be greater than zero")]
    ZeroSweepInterval,

    #[error("cache.geocode_capacity must be greater than zero")]
    ZeroCacheCapacity,

    #[error("geocode.bounds are inverted")]
    InvalidBounds,
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.backend.internal_key.is_empty() {
        errors.push(ValidationError::EmptyInternalKey);
    } else if !config
        .backend
        .internal_key
        .bytes()
        .all(|b| b.is_ascii_graphic())
    {
        errors.push(ValidationError::InvalidInternalKey);
    }

    check_url(&mut errors, "backend.base_url", &config.backend.base_url);
    check_url(&mut errors, "geocode.base_url", &config.geocode.base_url);
    if let Some(url) = &config.session.url {
        check_url(&mut errors, "session.url", url);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    let mut scopes = HashSet::new();
    let mut prefixes = HashSet::new();
    check_policy(&mut errors, &mut scopes, &config.rate_limit.default);
    for route in &config.rate_limit.routes {
        check_policy(&mut errors, &mut scopes, route);
        match route.path_prefix.as_deref() {
            Some(prefix) if prefix.starts_with('/') => {
                if !prefixes.insert(prefix.trim_end_matches('/').to_string()) {
                    errors.push(ValidationError::DuplicatePrefix(prefix.to_string()));
                }
            }
            _ => errors.push(ValidationError::InvalidPrefix(route.scope.clone())),
        }
    }

    if config.cache.geocode_capacity == 0 {
        errors.push(ValidationError::ZeroCacheCapacity);
    }

    let bounds = &config.geocode.bounds;
    if bounds.min_lat > bounds.max_lat || bounds.min_lng > bounds.max_lng {
        errors.push(ValidationError::InvalidBounds);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_policy(
    errors: &mut Vec<ValidationError>,
    scopes: &mut HashSet<String>,
    policy: &RoutePolicy,
) {
    if policy.scope.is_empty() {
        errors.push(ValidationError::EmptyScope);
    } else if !scopes.insert(policy.scope.clone()) {
        errors.push(ValidationError::DuplicateScope(policy.scope.clone()));
    }
    if policy.window_ms == 0 {
        errors.push(ValidationError::ZeroWindow(policy.scope.clone()));
    }
    if policy.max_requests == 0 {
        errors.push(ValidationError::ZeroLimit(policy.scope.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.backend.internal_key.clear();
        config.backend.base_url = "not a url".to_string();
        config.cache.geocode_capacity = 0;
        config.rate_limit.routes[0].window_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyInternalKey));
        assert!(errors.contains(&ValidationError::ZeroCacheCapacity));
        assert!(errors.contains(&ValidationError::ZeroWindow("chat".to_string())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidUrl { field: "backend.base_url", .. })));
    }

    #[test]
    fn test_duplicate_scope_and_prefix() {
        let mut config = GatewayConfig::default();
        let mut copy = config.rate_limit.routes[0].clone();
        config.rate_limit.routes.push(copy.clone());
        copy.scope = "chat-v2".to_string();
        config.rate_limit.routes.push(copy);

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateScope("chat".to_string())));
        assert!(errors.contains(&ValidationError::DuplicatePrefix("/api/chat".to_string())));
    }

    #[test]
    fn test_route_without_prefix_rejected() {
        let mut config = GatewayConfig::default();
        config.rate_limit.routes[0].path_prefix = None;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidPrefix("chat".to_string())]);
    }
}
