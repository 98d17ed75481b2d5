//! Gabay Gateway Library
//!
//! Internal gateway in front of the Gabay backend: resolves who is
//! calling, rate-limits per route, and forwards to the backend with the
//! shared internal key and the caller's identity headers.

pub mod cache;
pub mod config;
pub mod gateway;
pub mod geocode;
pub mod http;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod rate_limit;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use gateway::{GatewayClient, GatewayEnvelope};
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
