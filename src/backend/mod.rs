//! Backend API client
//!
//! Every method performs exactly one outbound request with no retry.
//! Callers decide how each failure class maps onto their own contract.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

use crate::auth::UserProfile;
use crate::config::BackendConfig;
use crate::metrics::record_backend_call;

const SIGN_IN_PATH: &str = "/api/auth/signin";
const REFRESH_PATH: &str = "/api/auth/refresh";
const VALIDATE_PATH: &str = "/api/auth/validate";
const USER_LOOKUP_PATH: &str = "/api/users";

/// Failure of a single backend call
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend answered with a non-success status
    #[error("backend responded with status {0}")]
    Rejected(StatusCode),

    /// Backend could not be reached (connect, timeout, reset)
    #[error("backend unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    /// Backend answered 2xx with a body we could not decode
    #[error("undecodable backend response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// `userObject` sent on sign-in
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendUserObject {
    pub email: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub github_id: String,
}

impl From<&UserProfile> for BackendUserObject {
    fn from(profile: &UserProfile) -> Self {
        Self {
            email: profile.email.clone(),
            name: profile.name.clone(),
            image_url: profile.image_url.clone(),
            github_id: profile.github_id.clone(),
        }
    }
}

/// Sign-in request body
#[derive(Debug, Clone, Serialize)]
pub struct SignInRequest {
    pub access_token: String,
    #[serde(rename = "userObject")]
    pub user_object: BackendUserObject,
}

/// Refresh request body
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Credentials returned by sign-in and refresh
///
/// Every field is optional; callers decide which absences they tolerate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialResponse {
    #[serde(default)]
    pub user: Option<serde_json::Value>,
    #[serde(default, rename = "jwtToken")]
    pub jwt_token: Option<String>,
    #[serde(default, rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

impl CredentialResponse {
    /// Session credential, ignoring empty strings
    pub fn session_credential(&self) -> Option<&str> {
        self.jwt_token.as_deref().filter(|token| !token.is_empty())
    }

    /// Refresh credential, ignoring empty strings
    pub fn refresh_credential(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|token| !token.is_empty())
    }
}

/// HTTP client for the backend API service
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    public_api_url: String,
}

impl BackendClient {
    /// Create a client sharing `http` for all calls
    pub fn new(http: reqwest::Client, config: &BackendConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            public_api_url: config.public_api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Mint a session credential from a provider access token
    pub async fn sign_in(
        &self,
        access_token: &str,
        profile: &UserProfile,
    ) -> Result<CredentialResponse, BackendError> {
        let body = SignInRequest {
            access_token: access_token.to_string(),
            user_object: BackendUserObject::from(profile),
        };
        let request = self
            .http
            .post(format!("{}{}", self.base_url, SIGN_IN_PATH))
            .json(&body);

        let response = send("signin", request).await?;
        response.json().await.map_err(BackendError::Decode)
    }

    /// Rotate credentials using a refresh credential
    pub async fn refresh(&self, refresh_token: &str) -> Result<CredentialResponse, BackendError> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        let request = self
            .http
            .post(format!("{}{}", self.base_url, REFRESH_PATH))
            .json(&body);

        let response = send("refresh", request).await?;
        response.json().await.map_err(BackendError::Decode)
    }

    /// Ask the backend whether a bearer credential is valid
    pub async fn validate(&self, bearer: &str) -> Result<(), BackendError> {
        let request = self
            .http
            .get(format!("{}{}", self.base_url, VALIDATE_PATH))
            .bearer_auth(bearer);

        send("validate", request).await.map(|_| ())
    }

    /// Fetch the raw user document for `username`
    pub async fn lookup_user(
        &self,
        username: &str,
        bearer: Option<&str>,
    ) -> Result<serde_json::Value, BackendError> {
        let mut request = self.http.get(format!(
            "{}{}/{}",
            self.public_api_url,
            USER_LOOKUP_PATH,
            urlencoding::encode(username)
        ));
        if let Some(bearer) = bearer {
            request = request.bearer_auth(bearer);
        }

        let response = send("user_lookup", request).await?;
        response.json().await.map_err(BackendError::Decode)
    }
}

async fn send(
    endpoint: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, BackendError> {
    let started = Instant::now();
    let result = request.send().await;
    let elapsed = started.elapsed();

    match result {
        Ok(response) if response.status().is_success() => {
            record_backend_call(endpoint, "ok", elapsed);
            Ok(response)
        }
        Ok(response) => {
            let status = response.status();
            record_backend_call(endpoint, "rejected", elapsed);
            tracing::warn!(endpoint, status = status.as_u16(), "Backend rejected request");
            Err(BackendError::Rejected(status))
        }
        Err(error) => {
            record_backend_call(endpoint, "unreachable", elapsed);
            tracing::warn!(endpoint, %error, "Backend request failed");
            Err(BackendError::Transport(error))
        }
    }
}
