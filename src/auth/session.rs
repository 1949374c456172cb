//! Provider session management
//!
//! The GitHub access token never leaves the server. The browser only
//! carries an HMAC-signed opaque session id in the `session` cookie;
//! the session itself lives in a volatile Moka cache.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use moka::future::Cache;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;

use crate::error::{AppError, Result};

/// Name of the cookie carrying the signed provider session id
pub const SESSION_COOKIE: &str = "session";

type HmacSha256 = Hmac<Sha256>;

/// Identity fields from GitHub, forwarded to the backend on exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    /// GitHub numeric user id, as a string
    pub github_id: String,
    /// GitHub login
    pub login: String,
}

/// Authenticated provider session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSession {
    /// GitHub OAuth access token
    ///
    /// `None` when the provider handshake completed without a token.
    pub access_token: Option<String>,
    pub profile: UserProfile,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl ProviderSession {
    /// Create a session valid for `max_age_seconds`
    pub fn new(access_token: Option<String>, profile: UserProfile, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            access_token,
            profile,
            created_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// In-memory provider session store
pub struct SessionStore {
    sessions: Cache<String, Arc<ProviderSession>>,
}

impl SessionStore {
    /// Create a store whose entries live at most `max_age_seconds`
    pub fn new(max_age_seconds: i64) -> Self {
        let ttl = std::time::Duration::from_secs(max_age_seconds.max(1) as u64);
        let sessions = Cache::builder().time_to_live(ttl).build();
        Self { sessions }
    }

    /// Store a session and return its freshly generated id
    pub async fn insert(&self, session: ProviderSession) -> String {
        let id = generate_session_id();
        self.sessions.insert(id.clone(), Arc::new(session)).await;
        self.publish_active_count().await;
        id
    }

    /// Look up a live session by id
    pub async fn get(&self, id: &str) -> Option<Arc<ProviderSession>> {
        let session = self.sessions.get(id).await?;
        if session.is_expired() {
            self.sessions.invalidate(id).await;
            self.publish_active_count().await;
            return None;
        }
        Some(session)
    }

    /// Drop a session
    pub async fn remove(&self, id: &str) {
        self.sessions.invalidate(id).await;
        self.publish_active_count().await;
    }

    /// Number of live sessions once pending writes and TTL evictions are applied
    pub async fn active_count(&self) -> u64 {
        self.sessions.run_pending_tasks().await;
        self.sessions.entry_count()
    }

    async fn publish_active_count(&self) {
        let count = self.active_count().await;
        crate::metrics::PROVIDER_SESSIONS_ACTIVE.set(count as i64);
    }
}

fn generate_session_id() -> String {
    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Sign a session id for the `session` cookie
///
/// Token format: base64(id).base64(hmac_sha256(base64(id)))
pub fn sign_session_id(id: &str, secret: &str) -> Result<String> {
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(id.as_bytes());

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify a signed session cookie value and return the session id
///
/// # Errors
/// Returns `Unauthorized` if the value is malformed or the signature does not match
pub fn verify_session_id(token: &str, secret: &str) -> Result<String> {
    let (payload_b64, signature_b64) = token.split_once('.').ok_or(AppError::Unauthorized)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;
    mac.verify_slice(&signature)
        .map_err(|_| AppError::Unauthorized)?;

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;

    String::from_utf8(payload).map_err(|_| AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-32-bytes-long!!!";

    fn profile() -> UserProfile {
        UserProfile {
            email: Some("octo@example.com".to_string()),
            name: Some("Octo Cat".to_string()),
            image_url: Some("https://avatars.example.com/u/1".to_string()),
            github_id: "1".to_string(),
            login: "octocat".to_string(),
        }
    }

    #[test]
    fn signed_session_id_round_trips() {
        let token = sign_session_id("abc123", SECRET).unwrap();
        assert_eq!(verify_session_id(&token, SECRET).unwrap(), "abc123");
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let token = sign_session_id("abc123", SECRET).unwrap();
        let forged = format!(
            "{}.{}",
            general_purpose::URL_SAFE_NO_PAD.encode("someone-else"),
            token.split_once('.').unwrap().1
        );

        assert!(matches!(
            verify_session_id(&forged, SECRET),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            verify_session_id(&token, "another-secret-key-32-bytes-long"),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            verify_session_id("no-dot-here", SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn store_returns_inserted_session_until_removed() {
        let store = SessionStore::new(3600);
        let id = store
            .insert(ProviderSession::new(Some("gho_token".to_string()), profile(), 3600))
            .await;

        let session = store.get(&id).await.expect("session present");
        assert_eq!(session.access_token.as_deref(), Some("gho_token"));
        assert_eq!(session.profile.login, "octocat");

        store.remove(&id).await;
        assert!(store.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn active_count_follows_inserts_and_removals() {
        let store = SessionStore::new(3600);
        let first = store
            .insert(ProviderSession::new(Some("gho_a".to_string()), profile(), 3600))
            .await;
        store
            .insert(ProviderSession::new(Some("gho_b".to_string()), profile(), 3600))
            .await;
        assert_eq!(store.active_count().await, 2);

        store.remove(&first).await;
        assert_eq!(store.active_count().await, 1);
    }

    #[tokio::test]
    async fn store_hides_expired_sessions() {
        let store = SessionStore::new(3600);
        let id = store
            .insert(ProviderSession::new(Some("gho_token".to_string()), profile(), -1))
            .await;

        assert!(store.get(&id).await.is_none());
    }
}
