//! Session credential rotation

use axum::{Json, extract::State};
use axum_extra::extract::CookieJar;
use serde_json::{Value, json};

use super::cookies::{REFRESH_COOKIE, refresh_credential_cookie, session_credential_cookie};
use crate::AppState;
use crate::backend::{BackendClient, BackendError};
use crate::error::{AppError, Result};

/// POST /api/auth/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>)> {
    refresh(&state.backend, jar, state.config.should_use_secure_cookies()).await
}

/// Rotate credentials using the `refreshToken` cookie in `jar`
///
/// Either new credential may be missing from the backend response;
/// whichever is present replaces its cookie.
pub async fn refresh(
    backend: &BackendClient,
    jar: CookieJar,
    secure: bool,
) -> Result<(CookieJar, Json<Value>)> {
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let credentials = backend
        .refresh(&refresh_token)
        .await
        .map_err(|error| match error {
            BackendError::Rejected(_) => AppError::Unauthorized,
            other => AppError::internal(other),
        })?;

    let mut jar = jar;
    let mut rotated = Vec::with_capacity(2);
    if let Some(jwt) = credentials.session_credential() {
        jar = jar.add(session_credential_cookie(jwt, secure));
        rotated.push("jwt");
    }
    if let Some(refresh) = credentials.refresh_credential() {
        jar = jar.add(refresh_credential_cookie(refresh, secure));
        rotated.push("refreshToken");
    }

    tracing::debug!(?rotated, "Refreshed credentials");

    Ok((jar, Json(json!({ "success": true }))))
}
