//! Trust bridge subsystem.
//!
//! # Data Flow
//! ```text
//! Identity + BackendCall
//!     → client.rs (auth check, header composition)
//!     → transport.rs (network call)
//!     → client.rs (normalize status/body)
//!     → envelope.rs (GatewayEnvelope<T>)
//! ```
//!
//! # Security Constraints
//! - The internal key is marked sensitive and never logged
//! - Identity headers are only sent for user calls

pub mod client;
pub mod envelope;
pub mod transport;

pub use client::{BackendCall, GatewayClient, GatewayError};
pub use envelope::{codes, ApiError, GatewayEnvelope};
pub use transport::{OutboundRequest, ReqwestTransport, Transport, TransportError, TransportResponse};
