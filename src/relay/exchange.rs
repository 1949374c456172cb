//! Provider token to session credential exchange

use axum::{Json, extract::State};
use axum_extra::extract::CookieJar;
use serde_json::{Value, json};

use super::cookies::{refresh_credential_cookie, session_credential_cookie};
use crate::AppState;
use crate::auth::{CurrentSession, ProviderSession};
use crate::backend::{BackendClient, BackendError};
use crate::error::{AppError, Result};

/// POST /api/auth/token
///
/// Exchanges the caller's provider session for a backend session credential.
pub async fn exchange_token(
    State(state): State<AppState>,
    CurrentSession(handle): CurrentSession,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>)> {
    let session = handle.as_ref().map(|handle| handle.session.as_ref());
    exchange(
        &state.backend,
        session,
        jar,
        state.config.should_use_secure_cookies(),
    )
    .await
}

/// Exchange an already-resolved provider session
///
/// # Errors
/// - `Unauthorized` when there is no session, no provider token, or the backend refuses
/// - `Internal` when the backend cannot be reached or answers garbage
pub async fn exchange(
    backend: &BackendClient,
    session: Option<&ProviderSession>,
    jar: CookieJar,
    secure: bool,
) -> Result<(CookieJar, Json<Value>)> {
    let session = session.ok_or(AppError::Unauthorized)?;
    let access_token = session
        .access_token
        .as_deref()
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let credentials = backend
        .sign_in(access_token, &session.profile)
        .await
        .map_err(|error| match error {
            BackendError::Rejected(_) => AppError::Unauthorized,
            other => AppError::internal(other),
        })?;

    let mut jar = jar;
    match credentials.session_credential() {
        Some(jwt) => jar = jar.add(session_credential_cookie(jwt, secure)),
        // Reported as success anyway; the client is told it signed in.
        None => tracing::warn!(
            login = %session.profile.login,
            "Backend sign-in succeeded without a session credential"
        ),
    }
    if let Some(refresh) = credentials.refresh_credential() {
        jar = jar.add(refresh_credential_cookie(refresh, secure));
    }

    tracing::info!(login = %session.profile.login, "Exchanged provider token");

    Ok((
        jar,
        Json(json!({
            "success": true,
            "user": credentials.user.unwrap_or(Value::Null),
        })),
    ))
}
