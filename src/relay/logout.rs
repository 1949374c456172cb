//! Session credential removal

use axum::{Json, extract::State};
use axum_extra::extract::CookieJar;
use serde_json::{Value, json};

use super::cookies::cleared_session_credential_cookie;
use crate::AppState;

/// POST /api/auth/logout
///
/// Overwrites `jwt` with an empty, already-expired cookie. Idempotent.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let secure = state.config.should_use_secure_cookies();
    (
        jar.add(cleared_session_credential_cookie(secure)),
        Json(json!({ "success": true })),
    )
}
