//! Bounded lookup caches.
//!
//! Used to short-circuit idempotent upstream lookups (geocoding) that are
//! rate-limited on the provider side. Per-process, best effort.

pub mod bounded;

pub use bounded::{normalize_key, BoundedCache};
