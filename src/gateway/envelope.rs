//! The success/data/error response wrapper used at every boundary.
//!
//! Wire shape: `{ "success": bool, "data"?: T, "error"?: { "code", "message" } }`.
//! `GatewayEnvelope` is an enum so a value can never carry both or neither.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Stable error codes produced by the gateway itself.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const API_ERROR: &str = "API_ERROR";
    pub const INVALID_PARAMS: &str = "INVALID_PARAMS";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const GEOCODE_FAILED: &str = "GEOCODE_FAILED";
    pub const OUT_OF_BOUNDS: &str = "OUT_OF_BOUNDS";
}

/// Structured error carried by a failed envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    /// Seconds until a rate-limited caller may retry.
    #[serde(
        rename = "retryAfter",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub retry_after: Option<u64>,
    /// Backend-specific detail, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            retry_after: None,
            details: None,
        }
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEnvelope<T> {
    Success(T),
    Failure(ApiError),
}

impl<T> GatewayEnvelope<T> {
    pub fn success(data: T) -> Self {
        GatewayEnvelope::Success(data)
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        GatewayEnvelope::Failure(ApiError::new(code, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GatewayEnvelope::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            GatewayEnvelope::Success(data) => Some(data),
            GatewayEnvelope::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            GatewayEnvelope::Success(_) => None,
            GatewayEnvelope::Failure(error) => Some(error),
        }
    }

    /// Code of a failed envelope.
    pub fn error_code(&self) -> Option<&str> {
        self.error().map(|e| e.code.as_str())
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            GatewayEnvelope::Success(data) => Ok(data),
            GatewayEnvelope::Failure(error) => Err(error),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> GatewayEnvelope<U> {
        match self {
            GatewayEnvelope::Success(data) => GatewayEnvelope::Success(f(data)),
            GatewayEnvelope::Failure(error) => GatewayEnvelope::Failure(error),
        }
    }
}

impl<T> From<ApiError> for GatewayEnvelope<T> {
    fn from(error: ApiError) -> Self {
        GatewayEnvelope::Failure(error)
    }
}

#[derive(Serialize)]
struct WireOut<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ApiError>,
}

impl<T: Serialize> Serialize for GatewayEnvelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            GatewayEnvelope::Success(data) => WireOut {
                success: true,
                data: Some(data),
                error: None,
            },
            GatewayEnvelope::Failure(error) => WireOut {
                success: false,
                data: None,
                error: Some(error),
            },
        };
        wire.serialize(serializer)
    }
}

#[derive(Deserialize)]
struct WireIn {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<ApiError>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for GatewayEnvelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireIn::deserialize(deserializer)?;
        match (wire.success, wire.error) {
            (true, None) => {
                // An absent `data` reads as null, which suits `()` and `Option<_>`.
                let data = wire.data.unwrap_or(Value::Null);
                T::deserialize(data)
                    .map(GatewayEnvelope::Success)
                    .map_err(D::Error::custom)
            }
            (true, Some(_)) => Err(D::Error::custom(
                "successful envelope must not carry an error",
            )),
            (false, Some(error)) => Ok(GatewayEnvelope::Failure(error)),
            (false, None) => Err(D::Error::custom("failed envelope must carry an error")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_wire_shape() {
        let env = GatewayEnvelope::success(json!({"id": "abc"}));
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"success": true, "data": {"id": "abc"}})
        );
    }

    #[test]
    fn test_failure_wire_shape() {
        let env: GatewayEnvelope<Value> =
            ApiError::new(codes::RATE_LIMIT_EXCEEDED, "slow down")
                .with_retry_after(12)
                .into();
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({
                "success": false,
                "error": {"code": "RATE_LIMIT_EXCEEDED", "message": "slow down", "retryAfter": 12}
            })
        );
    }

    #[test]
    fn test_parse_failure_keeps_details() {
        let env: GatewayEnvelope<Value> = serde_json::from_value(json!({
            "success": false,
            "error": {"code": "CONFLICT", "message": "Slot taken", "details": {"slot": 3}}
        }))
        .unwrap();
        let err = env.error().unwrap();
        assert_eq!(err.code, "CONFLICT");
        assert_eq!(err.details, Some(json!({"slot": 3})));
    }

    #[test]
    fn test_success_without_data() {
        let env: GatewayEnvelope<()> = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(env.is_success());
    }

    #[test]
    fn test_rejects_contradictory_envelopes() {
        assert!(serde_json::from_value::<GatewayEnvelope<Value>>(json!({
            "success": true,
            "data": 1,
            "error": {"code": "X", "message": "y"}
        }))
        .is_err());
        assert!(serde_json::from_value::<GatewayEnvelope<Value>>(json!({"success": false})).is_err());
    }

    #[test]
    fn test_typed_data_mismatch_is_error() {
        #[derive(Debug, Deserialize)]
        struct Facility {
            #[allow(dead_code)]
            name: String,
        }
        let parsed = serde_json::from_value::<GatewayEnvelope<Facility>>(json!({
            "success": true,
            "data": {"title": "no name"}
        }));
        assert!(parsed.is_err());
    }
}
