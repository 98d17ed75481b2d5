//! Rate limit middleware.
//! Resolves the caller once and enforces the matched route policy.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::config::RoutePolicy;
use crate::http::response::{apply_rate_limit_headers, rate_limited_response};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Route policy the request was matched against, for downstream handlers.
#[derive(Clone, Debug)]
pub struct MatchedPolicy(pub RoutePolicy);

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let identity = state.resolver.resolve(req.headers(), peer).await;
    let policy = state.policies.match_path(req.uri().path()).clone();

    let decision = if state.rate_limit_enabled {
        let decision = state.limiter.check_policy(&policy, &identity.client_key());
        if !decision.admitted {
            let response = rate_limited_response(&policy, &decision);
            metrics::record_request(&policy.scope, response.status().as_u16(), start);
            return response;
        }
        Some(decision)
    } else {
        None
    };

    let scope = policy.scope.clone();
    req.extensions_mut().insert(identity);
    req.extensions_mut().insert(MatchedPolicy(policy));

    let mut response = next.run(req).await;
    if let Some(decision) = decision {
        apply_rate_limit_headers(response.headers_mut(), &decision);
    }
    metrics::record_request(&scope, response.status().as_u16(), start);
    response
}
