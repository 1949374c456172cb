//! GitHub OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with GitHub and
//! turns the result into a server-side provider session.

use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use rand::RngCore;
use serde::Deserialize;

use super::middleware::CurrentSession;
use super::session::{ProviderSession, SESSION_COOKIE, UserProfile, sign_session_id};
use crate::AppState;
use crate::error::{AppError, Result};

const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_CALLBACK_COOKIE: &str = "oauth_callback";
const OAUTH_COOKIE_PATH: &str = "/auth/github";
const OAUTH_SCOPE: &str = "read:user user:email";
const CALLBACK_PATH: &str = "/auth/github/callback";

/// Create authentication router
///
/// Routes:
/// - GET /login - Login page
/// - GET /auth/github - Redirect to GitHub
/// - GET /auth/github/callback - OAuth callback
/// - POST /logout - End the provider session
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page))
        .route("/auth/github", get(github_redirect))
        .route(CALLBACK_PATH, get(github_callback))
        .route("/logout", post(sign_out))
}

/// `callbackUrl` carried through the sign-in flow
#[derive(Debug, Default, Deserialize)]
struct CallbackQuery {
    #[serde(rename = "callbackUrl")]
    callback_url: Option<String>,
}

// =============================================================================
// Login Page
// =============================================================================

/// GET /login
///
/// Renders a simple login page with GitHub sign-in button.
async fn login_page(Query(query): Query<CallbackQuery>) -> impl IntoResponse {
    let href = match query.callback_url.as_deref() {
        Some(callback) => format!(
            "/auth/github?callbackUrl={}",
            urlencoding::encode(callback)
        ),
        None => "/auth/github".to_string(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Sign in - ghpulse</title></head>
<body>
    <h1>ghpulse</h1>
    <p>Please sign in with GitHub</p>
    <a href="{}">Sign in with GitHub</a>
</body>
</html>
"#,
        html_escape::encode_double_quoted_attribute(&href)
    ))
}

// =============================================================================
// GitHub OAuth
// =============================================================================

/// GET /auth/github
///
/// Redirects user to GitHub authorization page.
///
/// # Steps
/// 1. Generate CSRF state token
/// 2. Store state and callback target in cookies
/// 3. Redirect to GitHub with client_id, redirect_uri, scope, state
async fn github_redirect(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    let github = &state.config.auth.github;
    let csrf_state = generate_csrf_state();
    let redirect_uri = format!("{}{}", state.config.server.base_url(), CALLBACK_PATH);

    let authorize_url = url::Url::parse_with_params(
        &github.authorize_url,
        &[
            ("client_id", github.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("scope", OAUTH_SCOPE),
            ("state", csrf_state.as_str()),
        ],
    )
    .map_err(|e| AppError::Config(format!("auth.github.authorize_url: {e}")))?;

    let secure = state.config.should_use_secure_cookies();
    let callback = safe_callback(
        query.callback_url.as_deref(),
        &state.config.server.base_url(),
    );
    let jar = jar
        .add(oauth_cookie(OAUTH_STATE_COOKIE, csrf_state, secure))
        .add(oauth_cookie(
            OAUTH_CALLBACK_COOKIE,
            urlencoding::encode(&callback).into_owned(),
            secure,
        ));

    Ok((jar, Redirect::to(authorize_url.as_str())))
}

/// Query parameters from GitHub callback
#[derive(Debug, Deserialize)]
struct GitHubCallbackQuery {
    /// Authorization code
    code: String,
    /// CSRF state token
    state: String,
}

/// GitHub token response
#[derive(Debug, Deserialize)]
struct GitHubTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// GitHub user info
#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    id: u64,
    avatar_url: Option<String>,
    name: Option<String>,
    email: Option<String>,
}

impl From<GitHubUser> for UserProfile {
    fn from(user: GitHubUser) -> Self {
        Self {
            email: user.email,
            name: user.name,
            image_url: user.avatar_url,
            github_id: user.id.to_string(),
            login: user.login,
        }
    }
}

/// GET /auth/github/callback
///
/// Handles OAuth callback from GitHub.
///
/// # Steps
/// 1. Verify CSRF state
/// 2. Exchange code for access token
/// 3. Fetch user info from GitHub
/// 4. Store provider session and set signed cookie
/// 5. Redirect to the original destination
async fn github_callback(
    State(state): State<AppState>,
    Query(query): Query<GitHubCallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    verify_csrf_state(&query.state, &jar)?;

    let github = &state.config.auth.github;
    let redirect_uri = format!("{}{}", state.config.server.base_url(), CALLBACK_PATH);

    let token: GitHubTokenResponse = state
        .http_client
        .post(&github.token_url)
        .header(http::header::ACCEPT, "application/json")
        .form(&[
            ("client_id", github.client_id.as_str()),
            ("client_secret", github.client_secret.as_str()),
            ("code", query.code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let access_token = match (token.access_token, token.error) {
        (Some(access_token), None) if !access_token.is_empty() => access_token,
        (_, error) => {
            tracing::warn!(?error, "GitHub refused the authorization code");
            return Err(AppError::Unauthorized);
        }
    };

    let user: GitHubUser = state
        .http_client
        .get(format!("{}/user", github.api_url.trim_end_matches('/')))
        .header(http::header::ACCEPT, "application/vnd.github+json")
        .bearer_auth(&access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let profile = UserProfile::from(user);
    tracing::info!(login = %profile.login, "GitHub sign-in completed");

    let max_age = state.config.auth.session_max_age;
    let session_id = state
        .sessions
        .insert(ProviderSession::new(Some(access_token), profile, max_age))
        .await;
    let signed = sign_session_id(&session_id, &state.config.auth.session_secret)?;

    let session_cookie = Cookie::build((SESSION_COOKIE, signed))
        .path("/")
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age))
        .build();

    let stored_callback = jar
        .get(OAUTH_CALLBACK_COOKIE)
        .and_then(|cookie| urlencoding::decode(cookie.value()).ok())
        .map(|value| value.into_owned());
    let callback = safe_callback(
        stored_callback.as_deref(),
        &state.config.server.base_url(),
    );

    let jar = jar
        .remove(Cookie::build(OAUTH_STATE_COOKIE).path(OAUTH_COOKIE_PATH))
        .remove(Cookie::build(OAUTH_CALLBACK_COOKIE).path(OAUTH_COOKIE_PATH))
        .add(session_cookie);

    Ok((jar, Redirect::to(&callback)))
}

// =============================================================================
// Sign out
// =============================================================================

/// POST /logout
///
/// Drops the provider session and redirects to login.
async fn sign_out(
    State(state): State<AppState>,
    CurrentSession(handle): CurrentSession,
    jar: CookieJar,
) -> impl IntoResponse {
    if let Some(handle) = handle {
        state.sessions.remove(&handle.id).await;
        tracing::info!(login = %handle.session.profile.login, "Provider session ended");
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/login"))
}

// =============================================================================
// Helpers
// =============================================================================

fn oauth_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(OAUTH_COOKIE_PATH)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(10))
        .build()
}

/// Generate a random CSRF state token
fn generate_csrf_state() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Verify CSRF state from cookie matches callback state
fn verify_csrf_state(state: &str, jar: &CookieJar) -> Result<()> {
    let expected = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AppError::Unauthorized)?;

    if expected.is_empty() || expected != state {
        tracing::warn!("OAuth state mismatch");
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Keep only same-origin callback targets
///
/// Accepts absolute paths and absolute URLs under `base_url`; anything
/// else falls back to `/`.
pub(crate) fn safe_callback(callback: Option<&str>, base_url: &str) -> String {
    let Some(callback) = callback.map(str::trim).filter(|c| !c.is_empty()) else {
        return "/".to_string();
    };

    if callback.starts_with('/') && !callback.starts_with("//") && !callback.starts_with("/\\") {
        return callback.to_string();
    }

    if let Some(rest) = callback.strip_prefix(base_url) {
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
            return callback.to_string();
        }
    }

    "/".to_string()
}
