//! Client identity subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound headers (cookie / bearer, x-forwarded-for, x-real-ip)
//!     → session.rs (SessionProvider lookup)
//!     → resolver.rs (Identified(session) | Anonymous(ip))
//!     → ClientKey for rate limiting, Session for the trust bridge
//! ```
//!
//! # Design Decisions
//! - Resolved once per request, stored in request extensions
//! - Lookup failures fail open to IP-based identity

pub mod resolver;
pub mod session;

pub use resolver::{client_ip, ClientKey, Identity, IdentityResolver};
pub use session::{
    HttpSessionProvider, MemorySessionStore, Session, SessionError, SessionProvider,
};
