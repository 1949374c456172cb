//! Backend reachability check

use axum::{Json, extract::State, http::HeaderMap};
use serde_json::{Value, json};

use crate::AppState;
use crate::backend::BackendError;
use crate::error::{AppError, Result};

/// Extract the token from `Authorization: Bearer <token>`
///
/// Returns `None` for a missing header, another scheme, or an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty() && !token.contains(char::is_whitespace))
}

/// GET /api/auth/check
///
/// Distinguishes a rejected token (401) from an unreachable backend (503).
pub async fn check_backend(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;

    match state.backend.validate(token).await {
        Ok(()) => Ok(Json(json!({ "status": "valid" }))),
        Err(BackendError::Rejected(status)) => Err(AppError::BackendRejected {
            status: status.as_u16(),
        }),
        Err(BackendError::Transport(error)) => {
            Err(AppError::ServiceUnavailable(error.to_string()))
        }
        Err(error @ BackendError::Decode(_)) => Err(AppError::internal(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn accepts_well_formed_bearer() {
        assert_eq!(bearer_token(&headers("Bearer ok123")), Some("ok123"));
    }

    #[test]
    fn rejects_missing_or_malformed_headers() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Bearer two tokens")), None);
        assert_eq!(bearer_token(&headers("bearerok123")), None);
    }
}
