//! Common test utilities for E2E tests
//!
//! Boots the real router next to a fake backend (which also plays
//! GitHub's OAuth endpoints) on ephemeral ports.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use ghpulse::{
    AppState,
    auth::{ProviderSession, UserProfile, sign_session_id},
    config,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const VALID_BEARER: &str = "ok123";
pub const GITHUB_CODE: &str = "good-code";
pub const GITHUB_TOKEN: &str = "gho_test_token";

/// Canned backend behaviour and call counters
#[derive(Clone)]
pub struct FakeBackend {
    pub signin_response: Arc<Mutex<(StatusCode, Value)>>,
    pub refresh_response: Arc<Mutex<(StatusCode, Value)>>,
    pub signin_calls: Arc<AtomicUsize>,
    pub refresh_calls: Arc<AtomicUsize>,
    pub validate_calls: Arc<AtomicUsize>,
    pub lookup_calls: Arc<AtomicUsize>,
    pub last_signin_body: Arc<Mutex<Option<Value>>>,
    pub last_refresh_body: Arc<Mutex<Option<Value>>>,
    pub last_lookup_bearer: Arc<Mutex<Option<String>>>,
    pub validate_delay: Arc<Mutex<Option<Duration>>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            signin_response: Arc::new(Mutex::new((
                StatusCode::OK,
                json!({ "user": { "id": 1 }, "jwtToken": "abc", "refreshToken": "r1" }),
            ))),
            refresh_response: Arc::new(Mutex::new((
                StatusCode::OK,
                json!({ "jwtToken": "x2", "refreshToken": "r2" }),
            ))),
            signin_calls: Arc::default(),
            refresh_calls: Arc::default(),
            validate_calls: Arc::default(),
            lookup_calls: Arc::default(),
            last_signin_body: Arc::default(),
            last_refresh_body: Arc::default(),
            last_lookup_bearer: Arc::default(),
            validate_delay: Arc::default(),
        }
    }
}

impl FakeBackend {
    pub fn respond_to_signin(&self, status: StatusCode, body: Value) {
        *self.signin_response.lock().unwrap() = (status, body);
    }

    pub fn respond_to_refresh(&self, status: StatusCode, body: Value) {
        *self.refresh_response.lock().unwrap() = (status, body);
    }

    /// Hold every validate response for `delay` before answering
    pub fn stall_validate(&self, delay: Duration) {
        *self.validate_delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self, counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn router(self) -> Router {
        Router::new()
            .route("/api/auth/signin", post(signin))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/validate", get(validate))
            .route("/api/users/:username", get(lookup))
            .route("/login/oauth/access_token", post(github_token))
            .route("/user", get(github_user))
            .with_state(self)
    }
}

async fn signin(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> impl IntoResponse {
    backend.signin_calls.fetch_add(1, Ordering::SeqCst);
    *backend.last_signin_body.lock().unwrap() = Some(body);
    let (status, body) = backend.signin_response.lock().unwrap().clone();
    (status, Json(body))
}

async fn refresh(
    State(backend): State<FakeBackend>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    *backend.last_refresh_body.lock().unwrap() = Some(body);
    let (status, body) = backend.refresh_response.lock().unwrap().clone();
    (status, Json(body))
}

async fn validate(State(backend): State<FakeBackend>, headers: HeaderMap) -> StatusCode {
    backend.validate_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *backend.validate_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let expected = format!("Bearer {VALID_BEARER}");
    match headers.get("authorization").and_then(|h| h.to_str().ok()) {
        Some(value) if value == expected => StatusCode::OK,
        _ => StatusCode::FORBIDDEN,
    }
}

async fn lookup(
    State(backend): State<FakeBackend>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    backend.lookup_calls.fetch_add(1, Ordering::SeqCst);
    *backend.last_lookup_bearer.lock().unwrap() = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .map(ToString::to_string);

    if username != "octocat" {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "no such user" })));
    }

    (
        StatusCode::OK,
        Json(json!({
            "id": "7",
            "login": "octocat",
            "name": "The Octocat",
            "followers": "20",
            "contributions": [{ "date": "2024-01-01", "count": 3 }, { "date": "2024-01-02", "count": 5 }],
            "repositories": null
        })),
    )
}

async fn github_token(body: String) -> Json<Value> {
    if body.contains(&format!("code={GITHUB_CODE}")) {
        Json(json!({ "access_token": GITHUB_TOKEN, "token_type": "bearer", "scope": "read:user" }))
    } else {
        Json(json!({ "error": "bad_verification_code" }))
    }
}

async fn github_user(headers: HeaderMap) -> impl IntoResponse {
    let expected = format!("Bearer {GITHUB_TOKEN}");
    match headers.get("authorization").and_then(|h| h.to_str().ok()) {
        Some(value) if value == expected => (
            StatusCode::OK,
            Json(json!({
                "login": "octocat",
                "id": 583231,
                "avatar_url": "https://avatars.example.com/u/583231",
                "name": "The Octocat",
                "email": "octocat@example.com"
            })),
        ),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Bad credentials" }))),
    }
}

/// Spawn `app` on an ephemeral port and return its base URL
async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// URL where nothing is listening
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn test_config(backend_url: &str) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            domain: "dash.test".to_string(),
            protocol: "http".to_string(),
        },
        app: config::AppModeConfig { production: false },
        backend: config::BackendConfig {
            base_url: backend_url.to_string(),
            public_api_url: backend_url.to_string(),
            timeout_seconds: 5,
        },
        auth: config::AuthConfig {
            session_secret: "test-secret-key-32-bytes-long!!!".to_string(),
            session_max_age: 3600,
            github: config::GitHubOAuthConfig {
                client_id: "test-client-id".to_string(),
                client_secret: "test-client-secret".to_string(),
                authorize_url: "https://github.com/login/oauth/authorize".to_string(),
                token_url: format!("{backend_url}/login/oauth/access_token"),
                api_url: backend_url.to_string(),
            },
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub backend: FakeBackend,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Server backed by a default fake backend
    pub async fn new() -> Self {
        Self::with_backend(FakeBackend::default()).await
    }

    /// Server backed by `backend`
    pub async fn with_backend(backend: FakeBackend) -> Self {
        let backend_url = spawn(backend.clone().router()).await;
        Self::start(test_config(&backend_url), backend).await
    }

    /// Server with a one second backend timeout whose validate endpoint
    /// answers only after that timeout has passed
    pub async fn with_stalled_validation() -> Self {
        let backend = FakeBackend::default();
        backend.stall_validate(Duration::from_secs(3));
        let backend_url = spawn(backend.clone().router()).await;

        let mut config = test_config(&backend_url);
        config.backend.timeout_seconds = 1;
        Self::start(config, backend).await
    }

    /// Server whose backend URL points at a closed port
    pub async fn with_unreachable_backend() -> Self {
        let url = unreachable_url().await;
        Self::start(test_config(&url), FakeBackend::default()).await
    }

    async fn start(config: config::AppConfig, backend: FakeBackend) -> Self {
        let state = AppState::new(config).unwrap();
        let addr = spawn(ghpulse::build_router(state.clone())).await;

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap();

        Self {
            addr,
            state,
            backend,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Store a provider session and return a `Cookie` header value for it
    pub async fn provider_session_cookie(&self, access_token: Option<&str>) -> String {
        let profile = UserProfile {
            email: Some("octocat@example.com".to_string()),
            name: Some("The Octocat".to_string()),
            image_url: Some("https://avatars.example.com/u/583231".to_string()),
            github_id: "583231".to_string(),
            login: "octocat".to_string(),
        };
        let session = ProviderSession::new(access_token.map(ToString::to_string), profile, 3600);
        let id = self.state.sessions.insert(session).await;
        let signed = sign_session_id(&id, &self.state.config.auth.session_secret).unwrap();
        format!("session={signed}")
    }
}

/// All `Set-Cookie` header values of a response
pub fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(ToString::to_string))
        .collect()
}

/// The `Set-Cookie` value for cookie `name`, if any
pub fn set_cookie(response: &reqwest::Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    set_cookies(response)
        .into_iter()
        .find(|value| value.starts_with(&prefix))
}
