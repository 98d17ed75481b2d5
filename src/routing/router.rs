//! Route policy lookup.
//!
//! # Responsibilities
//! - Store compiled route policies
//! - Resolve the policy for a request path
//! - Fall back to the default policy explicitly
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Prefixes match on whole path segments: `/api/chat` matches
//!   `/api/chat/stream` but not `/api/chatter`
//! - Longest prefix wins

use crate::config::{RateLimitConfig, RoutePolicy};

/// Matches a path prefix on segment boundaries.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        Self {
            prefix: if trimmed.is_empty() { "/".to_string() } else { trimmed.to_string() },
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return path.starts_with('/');
        }
        match path.strip_prefix(&self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }
}

#[derive(Debug)]
struct CompiledRoute {
    matcher: PathPrefixMatcher,
    policy: RoutePolicy,
}

/// Maps request paths to rate-limit policies.
#[derive(Debug)]
pub struct PolicyRouter {
    routes: Vec<CompiledRoute>,
    default: RoutePolicy,
}

impl PolicyRouter {
    pub fn new(default: RoutePolicy, routes: Vec<RoutePolicy>) -> Self {
        let mut compiled: Vec<CompiledRoute> = routes
            .into_iter()
            .filter_map(|policy| {
                let matcher = PathPrefixMatcher::new(policy.path_prefix.clone()?);
                Some(CompiledRoute { matcher, policy })
            })
            .collect();
        compiled.sort_by(|a, b| b.matcher.len().cmp(&a.matcher.len()));

        Self {
            routes: compiled,
            default,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.default.clone(), config.routes.clone())
    }

    pub fn match_path(&self, path: &str) -> &RoutePolicy {
        self.routes
            .iter()
            .find(|route| route.matcher.matches(path))
            .map(|route| &route.policy)
            .unwrap_or(&self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matcher_segments() {
        let matcher = PathPrefixMatcher::new("/api/chat/");

        assert!(matcher.matches("/api/chat"));
        assert!(matcher.matches("/api/chat/stream"));
        assert!(!matcher.matches("/api/chatter"));
        assert!(!matcher.matches("/images"));
    }

    #[test]
    fn test_longest_prefix_wins() {
        let router = PolicyRouter::new(
            RoutePolicy::per_minute("api", None, 60),
            vec![
                RoutePolicy::per_minute("facilities", Some("/api/facilities"), 60),
                RoutePolicy::per_minute("nearby", Some("/api/facilities/nearby"), 5),
            ],
        );

        assert_eq!(router.match_path("/api/facilities/nearby").scope, "nearby");
        assert_eq!(router.match_path("/api/facilities/12").scope, "facilities");
        assert_eq!(router.match_path("/api/unknown").scope, "api");
    }

    #[test]
    fn test_default_config_routes() {
        let router = PolicyRouter::from_config(&RateLimitConfig::default());
        let geocode = router.match_path("/api/geocode");
        assert_eq!(geocode.scope, "geocode");
        assert_eq!(geocode.max_requests, 10);
        assert!(!geocode.require_auth);
        assert!(router.match_path("/api/appointments/7").require_auth);

        let routing = router.match_path("/api/route");
        assert_eq!(routing.scope, "routing");
        assert_eq!(routing.max_requests, 30);
        assert_eq!(router.match_path("/api/route/directions").scope, "routing");

        let medications = router.match_path("/api/medications/courses");
        assert_eq!(medications.scope, "medications");
        assert_eq!(medications.max_requests, 120);
        assert!(medications.require_auth);
    }
}
