//! Trust bridge to the backend API.
//!
//! # Responsibilities
//! - Refuse authenticated calls without a session before any I/O
//! - Attach the shared internal key and, for user calls, identity headers
//! - Normalize every backend outcome into one `GatewayEnvelope`
//!
//! # Call Lifecycle
//! ```text
//! Building → AuthCheck ─ Unauthorized ───────────────→ Done
//!                     └─ Continue → Sending ─ TransportError → Done
//!                                           └─ Received ─────→ Done
//! ```
//!
//! # Design Decisions
//! - No retries: downstream operations are not known to be idempotent
//! - Holds no mutable state; cheap to clone into handlers

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::header::{self, HeaderName, HeaderValue, InvalidHeaderValue};
use axum::http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;
use crate::gateway::envelope::{codes, ApiError, GatewayEnvelope};
use crate::gateway::transport::{OutboundRequest, ReqwestTransport, Transport, TransportError};
use crate::identity::{Identity, Session};
use crate::observability::metrics;

pub const X_INTERNAL_KEY: HeaderName = HeaderName::from_static("x-internal-key");
pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const X_USER_EMAIL: HeaderName = HeaderName::from_static("x-user-email");
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Errors building a gateway client.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("internal key is not a valid header value")]
    InvalidKey(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One call to forward.
#[derive(Debug, Clone)]
pub struct BackendCall {
    /// Path (and query) relative to the backend base URL.
    pub endpoint: String,
    pub method: Method,
    pub body: Option<Value>,
    pub require_auth: bool,
    /// Correlation id propagated as `x-request-id`.
    pub request_id: Option<String>,
}

impl BackendCall {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            body: None,
            require_auth: true,
            request_id: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, endpoint).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_require_auth(mut self, require_auth: bool) -> Self {
        self.require_auth = require_auth;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Forwards calls to the trusted backend.
#[derive(Clone)]
pub struct GatewayClient {
    base_url: Url,
    internal_key: HeaderValue,
    transport: Arc<dyn Transport>,
}

impl GatewayClient {
    pub fn new(
        base_url: Url,
        internal_key: &str,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, GatewayError> {
        let mut internal_key = HeaderValue::from_str(internal_key)?;
        internal_key.set_sensitive(true);
        Ok(Self {
            base_url,
            internal_key,
            transport,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, GatewayError> {
        let transport = ReqwestTransport::new(
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Self::new(
            Url::parse(&config.base_url)?,
            &config.internal_key,
            Arc::new(transport),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Forward on behalf of the resolved caller. When `call.require_auth`
    /// is set and the caller has no session, the backend is never contacted.
    pub async fn forward<T: DeserializeOwned>(
        &self,
        identity: &Identity,
        call: BackendCall,
    ) -> GatewayEnvelope<T> {
        let subject = if call.require_auth {
            match identity.session() {
                Some(session) => Some(session),
                None => {
                    tracing::debug!(endpoint = %call.endpoint, "Rejecting unauthenticated backend call");
                    metrics::record_backend_call("unauthorized");
                    return GatewayEnvelope::failure(codes::UNAUTHORIZED, "Authentication required");
                }
            }
        } else {
            None
        };

        self.dispatch(subject, call).await
    }

    /// Forward as the gateway itself: internal key only, no identity headers.
    pub async fn forward_internal<T: DeserializeOwned>(&self, call: BackendCall) -> GatewayEnvelope<T> {
        self.dispatch(None, call.with_require_auth(false)).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        subject: Option<&Session>,
        call: BackendCall,
    ) -> GatewayEnvelope<T> {
        let url = match self.endpoint_url(&call.endpoint) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(endpoint = %call.endpoint, error = %e, "Invalid backend endpoint");
                return GatewayEnvelope::failure(
                    codes::API_ERROR,
                    format!("Invalid endpoint {}", call.endpoint),
                );
            }
        };

        let headers = match self.outbound_headers(subject, call.request_id.as_deref()) {
            Ok(headers) => headers,
            Err(_) => {
                tracing::warn!(endpoint = %call.endpoint, "Session subject is not a valid header value");
                return GatewayEnvelope::failure(
                    codes::UNAUTHORIZED,
                    "Session identity cannot be forwarded",
                );
            }
        };

        let request = OutboundRequest {
            method: call.method.clone(),
            url,
            headers,
            body: call.body,
        };

        let start = Instant::now();
        let result = self.transport.send(request).await;
        metrics::record_backend_duration(start);

        match result {
            Err(e) => {
                tracing::error!(
                    endpoint = %call.endpoint,
                    method = %call.method,
                    error = %e,
                    "Backend request failed"
                );
                metrics::record_backend_call("network_error");
                GatewayEnvelope::failure(codes::NETWORK_ERROR, "Failed to connect to API")
            }
            Ok(response) => {
                tracing::debug!(
                    endpoint = %call.endpoint,
                    method = %call.method,
                    status = %response.status,
                    "Backend responded"
                );
                normalize_response(response.status, &response.body)
            }
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        if endpoint.starts_with('/') {
            Url::parse(&format!("{}{}", base, endpoint))
        } else {
            Url::parse(&format!("{}/{}", base, endpoint))
        }
    }

    fn outbound_headers(
        &self,
        subject: Option<&Session>,
        request_id: Option<&str>,
    ) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(X_INTERNAL_KEY, self.internal_key.clone());

        if let Some(session) = subject {
            headers.insert(X_USER_ID, HeaderValue::from_str(&session.id)?);
            if let Some(email) = &session.email {
                match HeaderValue::from_str(email) {
                    Ok(value) => {
                        headers.insert(X_USER_EMAIL, value);
                    }
                    Err(_) => tracing::debug!("Dropping email that is not a valid header value"),
                }
            }
        }

        if let Some(id) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
            headers.insert(X_REQUEST_ID, id);
        }

        Ok(headers)
    }
}

/// Turn a backend HTTP response into an envelope.
///
/// 2xx bodies are already envelopes and pass through as parsed; other
/// statuses pass the backend's own `error` object through, or get a
/// synthesized `API_ERROR`.
pub fn normalize_response<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> GatewayEnvelope<T> {
    if status.is_success() {
        return match serde_json::from_slice::<GatewayEnvelope<T>>(body) {
            Ok(envelope) => {
                metrics::record_backend_call(if envelope.is_success() { "success" } else { "failure" });
                envelope
            }
            Err(e) => {
                tracing::warn!(status = %status, error = %e, "Backend returned an invalid envelope");
                metrics::record_backend_call("invalid_response");
                GatewayEnvelope::failure(
                    codes::API_ERROR,
                    format!("Invalid response from backend (status {})", status.as_u16()),
                )
            }
        };
    }

    metrics::record_backend_call("api_error");
    let passthrough = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|mut value| value.get_mut("error").map(Value::take))
        .and_then(|error| serde_json::from_value::<ApiError>(error).ok());

    match passthrough {
        Some(error) => GatewayEnvelope::Failure(error),
        None => GatewayEnvelope::failure(
            codes::API_ERROR,
            format!("Request failed with status {}", status.as_u16()),
        ),
    }
}
