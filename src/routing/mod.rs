//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (longest-prefix policy lookup)
//!     → RoutePolicy (rate-limit scope, window, require_auth)
//!
//! Policy Compilation (at startup):
//!     RateLimitConfig.routes
//!     → Build prefix matchers
//!     → Sort by prefix length
//!     → Freeze as immutable PolicyRouter
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same path always matches same policy

pub mod router;

pub use router::{PathPrefixMatcher, PolicyRouter};
