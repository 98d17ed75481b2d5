//! Envelope to HTTP response mapping.
//!
//! # Responsibilities
//! - Map envelope error codes to HTTP status codes
//! - Serialize envelopes as JSON bodies
//! - Attach rate-limit headers to admitted and rejected responses
//! - Give tower-http rejections (timeout, oversized body) envelope bodies
//!
//! # Design Decisions
//! - Successful envelopes are always 200
//! - Codes the gateway does not know (backend-defined) map to 500

use axum::{
    body::{Body, Bytes, HttpBody},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    BoxError, Json,
};
use serde::Serialize;

use crate::config::RoutePolicy;
use crate::gateway::{codes, ApiError, GatewayEnvelope};
use crate::rate_limit::Decision;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

pub fn status_for_code(code: &str) -> StatusCode {
    match code {
        codes::UNAUTHORIZED => StatusCode::UNAUTHORIZED,
        codes::FORBIDDEN => StatusCode::FORBIDDEN,
        codes::NOT_FOUND => StatusCode::NOT_FOUND,
        codes::CONFLICT => StatusCode::CONFLICT,
        codes::RATE_LIMIT_EXCEEDED => StatusCode::TOO_MANY_REQUESTS,
        codes::INVALID_PARAMS | codes::VALIDATION_ERROR | codes::OUT_OF_BOUNDS => {
            StatusCode::BAD_REQUEST
        }
        codes::NETWORK_ERROR | codes::GEOCODE_FAILED => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn envelope_status<T>(envelope: &GatewayEnvelope<T>) -> StatusCode {
    match envelope.error_code() {
        Some(code) => status_for_code(code),
        None => StatusCode::OK,
    }
}

pub fn envelope_response<T: Serialize>(envelope: GatewayEnvelope<T>) -> Response {
    (envelope_status(&envelope), Json(envelope)).into_response()
}

pub fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &Decision) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_at_secs()));
}

/// 429 for a rejected decision, with `Retry-After` in seconds.
pub fn rate_limited_response(policy: &RoutePolicy, decision: &Decision) -> Response {
    let retry_after = decision.retry_after_secs.unwrap_or(0);
    let envelope: GatewayEnvelope<()> =
        ApiError::new(codes::RATE_LIMIT_EXCEEDED, policy.message.clone())
            .with_retry_after(retry_after)
            .into();

    let mut response = envelope_response(envelope);
    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    apply_rate_limit_headers(headers, decision);
    response
}

/// Replace the empty 408/413 bodies produced by tower-http layers with
/// envelopes. Gateway responses never carry these statuses themselves.
pub async fn envelope_layer_rejections<B>(response: Response<B>) -> Response
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    match response.status() {
        StatusCode::REQUEST_TIMEOUT => {
            tracing::warn!("Request timed out");
            envelope_response(GatewayEnvelope::<()>::failure(
                codes::NETWORK_ERROR,
                "Request timed out",
            ))
        }
        StatusCode::PAYLOAD_TOO_LARGE => envelope_response(GatewayEnvelope::<()>::failure(
            codes::INVALID_PARAMS,
            "Request body too large",
        )),
        _ => response.map(Body::new),
    }
}
