//! ghpulse - authentication relay and data gateway for a GitHub analytics dashboard
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Layer (Axum)                       │
//! │  - GitHub sign-in (/login, /auth/github/*)                   │
//! │  - Credential relay (/api/auth/*)                            │
//! │  - Guarded dashboard data (/dashboard/*)                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Session & Data Layer                      │
//! │  - Provider session store (in-memory)                        │
//! │  - Payload normalization                                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Backend API (external, HTTP)                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `relay`: token exchange, refresh, logout and reachability check
//! - `auth`: GitHub OAuth, provider sessions, page guard
//! - `backend`: outbound client for the backend service
//! - `data`: dashboard data fetcher and view models
//! - `api`: dashboard and metrics routes
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod relay;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Cloned for each request. Holds no per-user mutable state besides
/// the provider session store.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Provider sessions (volatile)
    pub sessions: Arc<auth::SessionStore>,

    /// Backend API client
    pub backend: Arc<backend::BackendClient>,

    /// HTTP client for GitHub
    pub http_client: Arc<reqwest::Client>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: config::AppConfig) -> error::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("ghpulse/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.backend.timeout_seconds))
            .build()
            .map_err(error::AppError::internal)?;

        let backend = backend::BackendClient::new(http_client.clone(), &config.backend);
        let sessions = auth::SessionStore::new(config.auth.session_max_age);

        tracing::info!(
            backend = %config.backend.base_url,
            public_api = %config.backend.public_api_url,
            "Application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            backend: Arc::new(backend),
            http_client: Arc::new(http_client),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, middleware};
    use tower_http::trace::TraceLayer;

    let cors_layer = build_cors_layer(&state.config);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(auth::auth_router())
        .nest("/api/auth", relay::relay_router())
        .merge(api::dashboard_router(state.clone()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_session,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::metrics_router())
}

fn build_cors_layer(config: &config::AppConfig) -> tower_http::cors::CorsLayer {
    use axum::http::{HeaderValue, Method, header};
    use tower_http::cors::CorsLayer;

    if !config.app.production {
        return CorsLayer::permissive();
    }

    // Credentialed requests need an explicit origin, methods and headers.
    let allowed_origin = config.server.base_url();
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => layer.allow_origin([origin]),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from server base URL; denying cross-origin requests"
            );
            layer
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
