//! Session providers.
//!
//! # Responsibilities
//! - Extract the session token from inbound headers
//! - Look the session up (in memory or at the auth service)
//! - Report lookup failures as `SessionError`, never panic

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::SessionConfig;

/// An authenticated end-user session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Subject id.
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Errors that can occur during session lookup.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session service unreachable: {0}")]
    Transport(String),

    #[error("session service returned status {0}")]
    Status(u16),

    #[error("malformed session payload: {0}")]
    Decode(String),
}

/// Source of end-user sessions.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Look up the session attached to a request. `Ok(None)` means the
    /// caller is not signed in.
    async fn session(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError>;
}

/// Pull a session token from `Authorization: Bearer` or the named cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Token → session table held in memory.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Session>,
    cookie_name: String,
}

impl MemorySessionStore {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            sessions: DashMap::new(),
            cookie_name: cookie_name.into(),
        }
    }

    pub fn insert(&self, token: impl Into<String>, session: Session) {
        self.sessions.insert(token.into(), session);
    }

    pub fn revoke(&self, token: &str) -> Option<Session> {
        self.sessions.remove(token).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(SessionConfig::default().cookie_name)
    }
}

#[async_trait]
impl SessionProvider for MemorySessionStore {
    async fn session(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        Ok(session_token(headers, &self.cookie_name)
            .and_then(|token| self.sessions.get(&token).map(|s| s.value().clone())))
    }
}

#[derive(Debug, Deserialize)]
struct SessionPayload {
    #[serde(default)]
    user: Option<SessionUser>,
}

#[derive(Debug, Deserialize)]
struct SessionUser {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Asks the auth service who the caller is by replaying their credentials
/// against its session endpoint (`{ "user": { "id", "email" } }` or `{}`).
#[derive(Debug, Clone)]
pub struct HttpSessionProvider {
    client: reqwest::Client,
    url: Url,
    cookie_name: String,
}

impl HttpSessionProvider {
    pub fn new(url: Url, config: &SessionConfig) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url,
            cookie_name: config.cookie_name.clone(),
        })
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn session(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError> {
        // Nothing to replay: anonymous without a round trip.
        if session_token(headers, &self.cookie_name).is_none() {
            return Ok(None);
        }

        let mut forwarded = HeaderMap::new();
        for name in [header::COOKIE, header::AUTHORIZATION] {
            for value in headers.get_all(&name) {
                forwarded.append(name.clone(), value.clone());
            }
        }

        let response = self
            .client
            .get(self.url.clone())
            .headers(forwarded)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status(status.as_u16()));
        }

        let payload: SessionPayload = response
            .json()
            .await
            .map_err(|e| SessionError::Decode(e.to_string()))?;

        Ok(payload.user.and_then(|user| {
            user.id.filter(|id| !id.is_empty()).map(|id| Session {
                id,
                email: user.email.filter(|e| !e.is_empty()),
            })
        }))
    }
}
