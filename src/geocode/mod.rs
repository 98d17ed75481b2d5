//! Geocoding subsystem.
//!
//! # Data Flow
//! ```text
//! query
//!     → service.rs (validate, cache lookup)
//!     → nominatim.rs (upstream search, bounded to the service area)
//!     → service.rs (bounds check, cache insert)
//!     → GatewayEnvelope<GeoPoint>
//! ```

pub mod nominatim;
pub mod service;

pub use nominatim::{Candidate, GeocodeError, Geocoder, NominatimGeocoder};
pub use service::{GeoPoint, GeocodeService};
