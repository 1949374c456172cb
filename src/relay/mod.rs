//! Credential relay endpoints
//!
//! Thin handlers between the browser and the backend auth service.
//! Each one performs at most one backend call and keeps the backend's
//! credentials in HTTP-only cookies.

mod check;
pub mod cookies;
mod exchange;
mod logout;
mod refresh;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use check::{bearer_token, check_backend};
pub use exchange::{exchange, exchange_token};
pub use logout::logout;
pub use refresh::{refresh, refresh_token};

/// Create the relay router
///
/// Routes (nested under `/api/auth`):
/// - POST /token - Exchange provider session for a session credential
/// - POST /refresh - Rotate credentials from the refresh cookie
/// - POST /logout - Clear the session credential
/// - GET /check - Validate a bearer credential against the backend
pub fn relay_router() -> Router<AppState> {
    Router::new()
        .route("/token", post(exchange_token))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/check", get(check_backend))
}
