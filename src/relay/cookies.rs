//! Credential cookies
//!
//! Both credentials are HTTP-only, SameSite=Lax, site-wide, and marked
//! `Secure` only in production.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

/// Session credential cookie name
pub const JWT_COOKIE: &str = "jwt";
/// Refresh credential cookie name
pub const REFRESH_COOKIE: &str = "refreshToken";

const JWT_MAX_AGE: Duration = Duration::hours(24);
const REFRESH_MAX_AGE: Duration = Duration::days(7);

fn credential_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// `jwt` cookie holding a fresh session credential (24h)
pub fn session_credential_cookie(value: impl Into<String>, secure: bool) -> Cookie<'static> {
    let mut cookie = credential_cookie(JWT_COOKIE, value.into(), secure);
    cookie.set_max_age(JWT_MAX_AGE);
    cookie
}

/// `refreshToken` cookie holding a fresh refresh credential (7d)
pub fn refresh_credential_cookie(value: impl Into<String>, secure: bool) -> Cookie<'static> {
    let mut cookie = credential_cookie(REFRESH_COOKIE, value.into(), secure);
    cookie.set_max_age(REFRESH_MAX_AGE);
    cookie
}

/// Empty `jwt` cookie that expired at the Unix epoch
pub fn cleared_session_credential_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = credential_cookie(JWT_COOKIE, String::new(), secure);
    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
    cookie
}
