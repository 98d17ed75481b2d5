//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;

use gabay_gateway::cache::BoundedCache;
use gabay_gateway::config::GatewayConfig;
use gabay_gateway::gateway::GatewayClient;
use gabay_gateway::geocode::{GeocodeService, NominatimGeocoder};
use gabay_gateway::http::{AppState, HttpServer};
use gabay_gateway::identity::{IdentityResolver, MemorySessionStore, Session};
use gabay_gateway::rate_limit::WindowRateLimiter;
use gabay_gateway::routing::PolicyRouter;

pub const INTERNAL_KEY: &str = "test-internal-key";
pub const USER_TOKEN: &str = "token-maria";

/// Config pointing the backend and geocoder at mock servers.
pub fn test_config(backend_url: &str, geocode_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.backend.base_url = backend_url.to_string();
    config.backend.internal_key = INTERNAL_KEY.to_string();
    config.backend.connect_timeout_secs = 1;
    config.backend.request_timeout_secs = 5;
    config.geocode.base_url = geocode_url.to_string();
    config.geocode.timeout_secs = 5;
    config
}

/// Session store knowing one user, `u1` / `maria@example.ph`, under `USER_TOKEN`.
pub fn session_store(config: &GatewayConfig) -> Arc<MemorySessionStore> {
    let store = MemorySessionStore::new(config.session.cookie_name.clone());
    store.insert(USER_TOKEN, Session::new("u1").with_email("maria@example.ph"));
    Arc::new(store)
}

pub fn build_state(config: &GatewayConfig) -> AppState {
    let sessions = session_store(config);
    let geocoder = NominatimGeocoder::new(&config.geocode).unwrap();
    let cache = Arc::new(BoundedCache::new(config.cache.geocode_capacity));

    AppState {
        resolver: Arc::new(IdentityResolver::new(sessions)),
        limiter: WindowRateLimiter::in_memory(),
        policies: Arc::new(PolicyRouter::from_config(&config.rate_limit)),
        gateway: GatewayClient::from_config(&config.backend).unwrap(),
        geocode: Arc::new(GeocodeService::new(Arc::new(geocoder), cache, &config.geocode)),
        rate_limit_enabled: config.rate_limit.enabled,
        max_body_bytes: config.listener.max_body_bytes,
    }
}

pub fn build_router(config: &GatewayConfig) -> Router {
    HttpServer::new(build_state(config), &config.listener).router()
}

/// Request from a caller at `ip`, optionally carrying a bearer token.
pub fn request(method: Method, uri: &str, ip: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", ip);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
