pub mod geocode;
pub mod health;
pub mod proxy;

use axum::response::Response;

use crate::gateway::{codes, GatewayEnvelope};
use crate::http::response::envelope_response;

pub use geocode::geocode;
pub use health::health;
pub use proxy::proxy;

pub async fn not_found() -> Response {
    envelope_response(GatewayEnvelope::<()>::failure(codes::NOT_FOUND, "Route not found"))
}
