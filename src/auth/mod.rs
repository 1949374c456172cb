//! GitHub OAuth authentication
//!
//! Handles:
//! - GitHub OAuth flow
//! - Provider session management
//! - Session resolution middleware
//! - Page guard

mod guard;
mod middleware;
mod oauth;
pub mod session;

pub use guard::{AuthStatus, GuardDecision, guard, require_auth, sign_in_url};
pub use middleware::{CurrentSession, SessionHandle, resolve_session};
pub use oauth::auth_router;
pub use session::{
    ProviderSession, SESSION_COOKIE, SessionStore, UserProfile, sign_session_id,
    verify_session_id,
};
