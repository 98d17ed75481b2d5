//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, request limits).
    pub listener: ListenerConfig,

    /// Trusted backend the gateway forwards to.
    pub backend: BackendConfig,

    /// Session lookup for end-user authentication.
    pub session: SessionConfig,

    /// Per-route rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Bounded lookup caches.
    pub cache: CacheConfig,

    /// Upstream geocoder.
    pub geocode: GeocodeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Total time allowed for one inbound request, in seconds.
    pub request_timeout_secs: u64,

    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Trusted backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend API (e.g., "http://localhost:4000").
    pub base_url: String,

    /// Shared secret sent as `X-Internal-Key` on every call.
    pub internal_key: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total backend request timeout in seconds.
    pub request_timeout_secs: u64,
}

/// Key the backend accepts outside production deployments.
pub const DEV_INTERNAL_KEY: &str = "dev-internal-key";

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            // WARNING: development key. Override with INTERNAL_API_KEY in production.
            internal_key: DEV_INTERNAL_KEY.to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

/// Session lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session endpoint of the auth service. When unset, an in-memory
    /// token store is used and every caller is anonymous until seeded.
    pub url: Option<String>,

    /// Cookie carrying the session token.
    pub cookie_name: String,

    /// Session lookup timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: None,
            cookie_name: "authjs.session-token".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Rate limit policy for one class of routes.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RoutePolicy {
    /// Scope prefixed to the client key (e.g., "chat").
    pub scope: String,

    /// Path prefix the policy applies to. `None` only for the default policy.
    #[serde(default)]
    pub path_prefix: Option<String>,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Maximum admitted requests per window.
    pub max_requests: u32,

    /// Whether forwarding requires an authenticated session.
    #[serde(default = "default_require_auth")]
    pub require_auth: bool,

    /// Message returned with `RATE_LIMIT_EXCEEDED`.
    #[serde(default = "default_limit_message")]
    pub message: String,
}

fn default_require_auth() -> bool {
    true
}

fn default_limit_message() -> String {
    "Too many requests. Please try again later.".to_string()
}

impl RoutePolicy {
    /// Build a policy with a one-minute window.
    pub fn per_minute(scope: &str, path_prefix: Option<&str>, max_requests: u32) -> Self {
        Self {
            scope: scope.to_string(),
            path_prefix: path_prefix.map(str::to_string),
            window_ms: 60_000,
            max_requests,
            require_auth: true,
            message: default_limit_message(),
        }
    }

    pub fn public(mut self) -> Self {
        self.require_auth = false;
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Interval between sweeps of expired windows, in seconds.
    pub sweep_interval_secs: u64,

    /// Policy for paths no route matches.
    pub default: RoutePolicy,

    /// Per-route policies, matched by longest path prefix.
    pub routes: Vec<RoutePolicy>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_secs: 60,
            default: RoutePolicy::per_minute("api", None, 60),
            routes: vec![
                RoutePolicy::per_minute("chat", Some("/api/chat"), 20).with_message(
                    "Maraming request. Subukan ulit pagkatapos ng isang minuto. (Too many requests. Please wait a minute.)",
                ),
                RoutePolicy::per_minute("geocode", Some("/api/geocode"), 10)
                    .public()
                    .with_message("Too many geocoding requests. Please wait a minute."),
                RoutePolicy::per_minute("booking", Some("/api/appointments"), 10)
                    .with_message("Too many booking requests. Please wait a minute."),
                RoutePolicy::per_minute("routing", Some("/api/route"), 30)
                    .public()
                    .with_message("Too many routing requests. Please wait a moment."),
                RoutePolicy::per_minute("facilities", Some("/api/facilities"), 60)
                    .public()
                    .with_message("Too many requests. Please wait a moment."),
                RoutePolicy::per_minute("medications", Some("/api/medications"), 120)
                    .with_message("Too many medication requests. Please wait a moment."),
            ],
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached geocode results.
    pub geocode_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            geocode_capacity: 200,
        }
    }
}

/// Geographic bounding box.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }

    /// Nominatim `viewbox` parameter: `left,top,right,bottom`.
    pub fn viewbox(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lng, self.max_lat, self.max_lng, self.min_lat
        )
    }
}

impl Default for Bounds {
    // Naga City, Camarines Sur
    fn default() -> Self {
        Self {
            min_lat: 13.55,
            max_lat: 13.70,
            min_lng: 123.15,
            max_lng: 123.35,
        }
    }
}

/// Upstream geocoder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeocodeConfig {
    /// Nominatim-compatible base URL.
    pub base_url: String,

    /// Contact email sent to the geocoder, if any.
    pub email: Option<String>,

    /// User-Agent header (Nominatim rejects anonymous clients).
    pub user_agent: String,

    /// Suffix appended to queries that do not mention the locality.
    pub locality: String,

    /// Lowercase word that marks a query as already localized.
    pub locality_hint: String,

    /// Results outside these bounds are rejected.
    pub bounds: Bounds,

    /// Geocoder request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            email: None,
            user_agent: "GabayGateway/0.1".to_string(),
            locality: "Naga City, Camarines Sur, Philippines".to_string(),
            locality_hint: "naga".to_string(),
            bounds: Bounds::default(),
            timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
