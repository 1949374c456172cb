//! Provider session resolution
//!
//! Resolves the `session` cookie into a [`ProviderSession`] once per
//! request so handlers receive the identity as an explicit argument.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use super::session::{ProviderSession, SESSION_COOKIE, verify_session_id};
use crate::AppState;

/// A resolved provider session together with its store id
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: String,
    pub session: Arc<ProviderSession>,
}

/// Marker stored after resolution so extractors don't repeat the lookup
#[derive(Debug, Clone)]
struct Resolved(Option<SessionHandle>);

async fn lookup(jar: &CookieJar, state: &AppState) -> Option<SessionHandle> {
    let cookie = jar.get(SESSION_COOKIE)?;
    let id = match verify_session_id(cookie.value(), &state.config.auth.session_secret) {
        Ok(id) => id,
        Err(error) => {
            tracing::debug!(%error, "Ignoring session cookie with bad signature");
            return None;
        }
    };
    let session = state.sessions.get(&id).await?;
    Some(SessionHandle { id, session })
}

/// Middleware resolving the provider session
///
/// Never rejects: requests without a valid session continue with no
/// identity attached. Gating is done by the handlers and the page guard.
///
/// # Usage
/// ```ignore
/// let app = Router::new()
///     .route("/api/auth/token", post(exchange))
///     .layer(middleware::from_fn_with_state(state, resolve_session));
/// ```
pub async fn resolve_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let handle = lookup(&jar, &state).await;
    request.extensions_mut().insert(Resolved(handle));
    next.run(request).await
}

/// Extractor for the caller's provider session, if any
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentSession(session): CurrentSession) -> impl IntoResponse {
///     session.map(|s| s.session.profile.login.clone()).unwrap_or_default()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Option<SessionHandle>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(Resolved(handle)) = parts.extensions.get::<Resolved>().cloned() {
            return Ok(CurrentSession(handle));
        }

        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let handle = lookup(&jar, &app_state).await;
        parts.extensions.insert(Resolved(handle.clone()));

        Ok(CurrentSession(handle))
    }
}
