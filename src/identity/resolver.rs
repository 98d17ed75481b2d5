//! Client identity resolution.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use axum::http::HeaderMap;

use crate::identity::session::{Session, SessionProvider};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Rate-limit key for one caller: `user:<id>` or `ip:<address>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientKey {
    User(String),
    Ip(String),
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientKey::User(id) => write!(f, "user:{}", id),
            ClientKey::Ip(addr) => write!(f, "ip:{}", addr),
        }
    }
}

/// Who a request came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// The session provider vouched for a subject.
    Identified(Session),
    /// No usable session; carries the best-known client address.
    Anonymous(String),
}

impl Identity {
    pub fn client_key(&self) -> ClientKey {
        match self {
            Identity::Identified(session) => ClientKey::User(session.id.clone()),
            Identity::Anonymous(ip) => ClientKey::Ip(ip.clone()),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Identity::Identified(session) => Some(session),
            Identity::Anonymous(_) => None,
        }
    }

    pub fn is_identified(&self) -> bool {
        matches!(self, Identity::Identified(_))
    }
}

/// Resolves the identity of inbound requests.
#[derive(Clone)]
pub struct IdentityResolver {
    sessions: Arc<dyn SessionProvider>,
}

impl IdentityResolver {
    pub fn new(sessions: Arc<dyn SessionProvider>) -> Self {
        Self { sessions }
    }

    /// Resolve a caller. Never fails: session lookup errors degrade to
    /// `Anonymous` so rate-limit accounting is never blocked by auth.
    pub async fn resolve(&self, headers: &HeaderMap, peer: Option<IpAddr>) -> Identity {
        match self.sessions.session(headers).await {
            Ok(Some(session)) if !session.id.is_empty() => return Identity::Identified(session),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Session lookup failed, treating caller as anonymous");
            }
        }
        Identity::Anonymous(client_ip(headers, peer))
    }
}

/// First `x-forwarded-for` entry, then `x-real-ip`, then the socket peer,
/// then `unknown`.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(ip) = header_value(X_FORWARDED_FOR)
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return ip.to_string();
    }
    if let Some(ip) = header_value(X_REAL_IP) {
        return ip.to_string();
    }
    peer.map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
