//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared application state from configuration
//! - Create the Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID, rate limit)
//! - Serve on a listener until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use url::Url;

use crate::cache::BoundedCache;
use crate::config::{GatewayConfig, ListenerConfig};
use crate::gateway::{GatewayClient, GatewayError};
use crate::geocode::{GeocodeError, GeocodeService, NominatimGeocoder};
use crate::http::handlers;
use crate::http::middleware::rate_limit_middleware;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::envelope_layer_rejections;
use crate::identity::{
    HttpSessionProvider, IdentityResolver, MemorySessionStore, SessionError, SessionProvider,
};
use crate::lifecycle::shutdown;
use crate::rate_limit::WindowRateLimiter;
use crate::routing::PolicyRouter;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Gateway(#[from] GatewayError),

    #[error("session provider: {0}")]
    Session(#[from] SessionError),

    #[error("geocoder: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("invalid session url: {0}")]
    SessionUrl(#[from] url::ParseError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<IdentityResolver>,
    pub limiter: WindowRateLimiter,
    pub policies: Arc<PolicyRouter>,
    pub gateway: GatewayClient,
    pub geocode: Arc<GeocodeService>,
    pub rate_limit_enabled: bool,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, StateError> {
        let sessions: Arc<dyn SessionProvider> = match &config.session.url {
            Some(url) => Arc::new(HttpSessionProvider::new(Url::parse(url)?, &config.session)?),
            None => {
                tracing::warn!("No session URL configured, every caller is anonymous");
                Arc::new(MemorySessionStore::new(config.session.cookie_name.clone()))
            }
        };

        let cache = Arc::new(BoundedCache::new(config.cache.geocode_capacity));
        let geocoder = Arc::new(NominatimGeocoder::new(&config.geocode)?);

        Ok(Self {
            resolver: Arc::new(IdentityResolver::new(sessions)),
            limiter: WindowRateLimiter::in_memory(),
            policies: Arc::new(PolicyRouter::from_config(&config.rate_limit)),
            gateway: GatewayClient::from_config(&config.backend)?,
            geocode: Arc::new(GeocodeService::new(geocoder, cache, &config.geocode)),
            rate_limit_enabled: config.rate_limit.enabled,
            max_body_bytes: config.listener.max_body_bytes,
        })
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, config: &ListenerConfig) -> Self {
        Self {
            router: Self::build_router(state, config),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState, config: &ListenerConfig) -> Router {
        let api = Router::new()
            .route("/api/geocode", get(handlers::geocode))
            .route("/api/{*path}", any(handlers::proxy))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ));

        Router::new()
            .route("/health", get(handlers::health))
            .merge(api)
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(middleware::map_response(envelope_layer_rejections))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
