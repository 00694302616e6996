/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - An in-memory store behind the real router
/// - Test user registration through the API
/// - JSON request helpers
/// - A scripted OAuth provider and the Google sign-in round trip
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use taskdeck_api::app::{build_router, AppState};
use taskdeck_api::config::Config;
use taskdeck_api::oauth::{OAuthError, OAuthProvider};
use taskdeck_api::routes::auth::STATE_COOKIE;
use taskdeck_shared::auth::oauth::OAuthProfile;
use taskdeck_shared::store::{InMemoryStore, Store};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const PASSWORD: &str = "s3cretpass";

/// `state` and `Cookie` header value handed out by `GET /v1/auth/google`
pub struct GoogleSignIn {
    pub state: String,
    pub cookie: String,
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<dyn Store>,
    pub app: axum::Router,
}

/// Config with only the required values plus `extra`
pub fn test_config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        (
            "DATABASE_URL".to_string(),
            "postgresql://unused/taskdeck_test".to_string(),
        ),
        ("JWT_SECRET".to_string(), JWT_SECRET.to_string()),
    ]);
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config")
}

impl TestContext {
    /// Router over a fresh in-memory store, Google sign-in disabled
    pub fn new() -> Self {
        Self::with_state(|store| AppState::new(store, test_config(&[])))
    }

    pub fn with_state(build: impl FnOnce(Arc<dyn Store>) -> AppState) -> Self {
        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let app = build_router(build(store.clone()));
        Self { store, app }
    }

    /// Sends a request and returns the raw response
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        self.send_with_cookie(method, uri, token, body, None).await
    }

    pub async fn send_with_cookie(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    /// Sends a request and decodes the JSON body (`Null` when empty)
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        read_json(self.send(method, uri, token, body).await).await
    }

    /// Follows `GET /v1/auth/google` and captures its state and cookie
    pub async fn start_google_sign_in(&self) -> GoogleSignIn {
        let response = self.send(Method::GET, "/v1/auth/google", None, None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

        let location = response.headers()[header::LOCATION].to_str().unwrap();
        let state = location
            .split_once("state=")
            .map(|(_, rest)| rest.split('&').next().unwrap().to_string())
            .expect("consent URL carries state");

        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        let cookie = set_cookie.split(';').next().unwrap().trim().to_string();
        assert_eq!(cookie, format!("{STATE_COOKIE}={state}"));

        GoogleSignIn { state, cookie }
    }

    /// Calls the Google callback with an optional `Cookie` header
    pub async fn google_callback(&self, query: &str, cookie: Option<&str>) -> Response {
        let uri = format!("/v1/auth/google/callback?{query}");
        self.send_with_cookie(Method::GET, &uri, None, None, cookie).await
    }

    /// Registers a user and returns its session token
    pub async fn register(&self, email: &str, name: &str) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/v1/auth/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": PASSWORD,
                    "name": name,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }
}

/// Status and decoded JSON body (`Null` when empty)
pub async fn read_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))
    };
    (status, value)
}

/// Provider that accepts one code and answers with a fixed profile
pub struct ScriptedProvider {
    pub code: String,
    pub profile: OAuthProfile,
}

#[async_trait]
impl OAuthProvider for ScriptedProvider {
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        Ok(format!(
            "https://accounts.example.test/consent?client_id=test&state={state}"
        ))
    }

    async fn fetch_profile(&self, code: &str) -> Result<OAuthProfile, OAuthError> {
        if code == self.code {
            Ok(self.profile.clone())
        } else {
            Err(OAuthError::InvalidResponse("unknown code".to_string()))
        }
    }
}
