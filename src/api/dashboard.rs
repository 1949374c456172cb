//! Dashboard data endpoints
//!
//! Protected by the page guard; unauthenticated visitors are sent to
//! the sign-in page with their destination preserved.

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::auth::{CurrentSession, require_auth};
use crate::data::{GithubUser, fetch_github_user};
use crate::error::{AppError, Result};
use crate::relay::cookies::JWT_COOKIE;

/// Create dashboard router
///
/// Routes:
/// - GET /dashboard - Redirect to the signed-in user's dashboard
/// - GET /dashboard/:username - Normalized profile, repositories and contributions
pub fn dashboard_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(own_dashboard))
        .route("/dashboard/:username", get(user_dashboard))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// GET /dashboard
async fn own_dashboard(CurrentSession(handle): CurrentSession) -> Response {
    match handle {
        Some(handle) => {
            let login = urlencoding::encode(&handle.session.profile.login).into_owned();
            Redirect::to(&format!("/dashboard/{login}")).into_response()
        }
        None => Redirect::to("/login").into_response(),
    }
}

/// GET /dashboard/:username
///
/// Forwards the caller's session credential, when present, as a bearer token.
async fn user_dashboard(
    State(state): State<AppState>,
    Path(username): Path<String>,
    jar: CookieJar,
) -> Result<Json<GithubUser>> {
    let bearer = jar
        .get(JWT_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty());

    fetch_github_user(&state.backend, &username, bearer.as_deref())
        .await
        .map(Json)
        .ok_or(AppError::NotFound)
}
