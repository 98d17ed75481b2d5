//! Session resolution against an HTTP session endpoint.

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use serde_json::json;
use url::Url;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gabay_gateway::config::SessionConfig;
use gabay_gateway::identity::{
    ClientKey, HttpSessionProvider, Identity, IdentityResolver, SessionError, SessionProvider,
};

fn provider(server: &MockServer) -> HttpSessionProvider {
    let url = Url::parse(&format!("{}/api/auth/session", server.uri())).unwrap();
    HttpSessionProvider::new(url, &SessionConfig::default()).unwrap()
}

fn cookie_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("authjs.session-token={}", token)).unwrap(),
    );
    headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
    headers
}

#[tokio::test]
async fn test_session_resolved_from_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/session"))
        .and(header_eq("cookie", "authjs.session-token=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": "u7", "email": "juan@example.ph"},
            "expires": "2026-12-01T00:00:00.000Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = IdentityResolver::new(Arc::new(provider(&server)));
    let identity = resolver.resolve(&cookie_headers("abc"), None).await;

    let session = identity.session().unwrap();
    assert_eq!(session.id, "u7");
    assert_eq!(session.email.as_deref(), Some("juan@example.ph"));
    assert_eq!(identity.client_key().to_string(), "user:u7");
}

#[tokio::test]
async fn test_empty_session_is_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let resolver = IdentityResolver::new(Arc::new(provider(&server)));
    let identity = resolver.resolve(&cookie_headers("expired"), None).await;

    assert_eq!(identity, Identity::Anonymous("203.0.113.9".to_string()));
    assert_eq!(identity.client_key(), ClientKey::Ip("203.0.113.9".to_string()));
}

#[tokio::test]
async fn test_no_credentials_skips_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = provider(&server).session(&HeaderMap::new()).await.unwrap();
    assert!(session.is_none());
}

#[tokio::test]
async fn test_session_service_error_degrades_to_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = provider(&server);
    let err = provider.session(&cookie_headers("abc")).await.unwrap_err();
    assert!(matches!(err, SessionError::Status(500)));

    let resolver = IdentityResolver::new(Arc::new(provider));
    let identity = resolver.resolve(&cookie_headers("abc"), None).await;
    assert!(!identity.is_identified());
}
