//! Backend passthrough.
//!
//! The inbound path and query are forwarded unchanged. The JSON body,
//! if any, is forwarded unmodified. Identity comes from the rate limit
//! middleware, so the session is looked up once per request.

use axum::{
    body,
    extract::{Request, State},
    response::Response,
    Extension,
};
use serde_json::Value;

use crate::gateway::{codes, BackendCall, GatewayEnvelope};
use crate::http::middleware::MatchedPolicy;
use crate::http::request::request_id;
use crate::http::response::envelope_response;
use crate::http::server::AppState;
use crate::identity::Identity;

pub async fn proxy(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Extension(MatchedPolicy(policy)): Extension<MatchedPolicy>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let endpoint = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let bytes = match body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(endpoint = %endpoint, error = %e, "Failed to read request body");
            return envelope_response(GatewayEnvelope::<()>::failure(
                codes::INVALID_PARAMS,
                "Request body could not be read",
            ));
        }
    };

    let mut call = BackendCall::new(parts.method, endpoint).with_require_auth(policy.require_auth);
    if !bytes.is_empty() {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(json) => call = call.with_body(json),
            Err(_) => {
                return envelope_response(GatewayEnvelope::<()>::failure(
                    codes::INVALID_PARAMS,
                    "Request body must be JSON",
                ));
            }
        }
    }
    if let Some(id) = request_id(&parts.headers) {
        call = call.with_request_id(id);
    }

    let envelope: GatewayEnvelope<Value> = state.gateway.forward(&identity, call).await;
    envelope_response(envelope)
}
