//! Page guard
//!
//! Gates protected pages on the provider session. Authentication
//! presence is the only check; there are no roles at this layer.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};

use super::middleware::{CurrentSession, SessionHandle};
use crate::AppState;

/// Session status as seen by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Session not yet resolved
    Loading,
    Unauthenticated,
    Authenticated,
}

impl AuthStatus {
    /// Status for a resolved session lookup
    pub fn from_session(handle: Option<&SessionHandle>) -> Self {
        match handle {
            Some(_) => AuthStatus::Authenticated,
            None => AuthStatus::Unauthenticated,
        }
    }
}

/// What the guard does for a given status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    ShowLoading,
    RedirectTo(String),
    Render,
}

/// Decide how to handle a request for `current_url`
pub fn guard(status: AuthStatus, current_url: &str) -> GuardDecision {
    match status {
        AuthStatus::Loading => GuardDecision::ShowLoading,
        AuthStatus::Unauthenticated => GuardDecision::RedirectTo(sign_in_url(current_url)),
        AuthStatus::Authenticated => GuardDecision::Render,
    }
}

/// Sign-in page URL that returns to `current_url` afterwards
pub fn sign_in_url(current_url: &str) -> String {
    format!("/login?callbackUrl={}", urlencoding::encode(current_url))
}

/// Middleware protecting page routes
///
/// # Usage
/// ```ignore
/// let pages = Router::new()
///     .route("/dashboard/:username", get(user_dashboard))
///     .route_layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    CurrentSession(handle): CurrentSession,
    request: Request,
    next: Next,
) -> Response {
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let current_url = format!("{}{}", state.config.server.base_url(), path);

    match guard(AuthStatus::from_session(handle.as_ref()), &current_url) {
        GuardDecision::Render => next.run(request).await,
        GuardDecision::RedirectTo(location) => {
            tracing::debug!(%current_url, "Redirecting unauthenticated visitor to sign-in");
            Redirect::to(&location).into_response()
        }
        GuardDecision::ShowLoading => loading_page().into_response(),
    }
}

fn loading_page() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>Loading - ghpulse</title><meta http-equiv="refresh" content="1"></head>
<body><p>Loading...</p></body>
</html>
"#,
    )
}
