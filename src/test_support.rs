//! Helpers for driving the router in unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use futures::{stream, StreamExt};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::{hash_password, JwtKeys},
    config::{AppConfig, RuntimeEnv},
    provider::{ChunkStream, Draft, ProviderError, TextGenerator},
    state::AppState,
    store::{MemoryStore, NewUser, User},
};

pub(crate) const PASSWORD: &str = "password123";

/// Creates a user directly in the store and signs an access token for it.
pub(crate) async fn seed_user(state: &AppState, email: &str, is_admin: bool) -> (User, String) {
    let user = state
        .store
        .create_user(NewUser {
            email: email.to_string(),
            password_hash: hash_password(PASSWORD).unwrap(),
            name: email.split('@').next().unwrap().to_string(),
        })
        .await
        .unwrap();
    let user = if is_admin {
        state.store.set_admin(user.id, true).await.unwrap().unwrap()
    } else {
        user
    };
    let token = JwtKeys::from(&state.config.jwt).sign_access(user.id).unwrap();
    (user, token)
}

pub(crate) fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends one request through a fresh router and decodes the JSON body (`Null` if empty).
pub(crate) async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(build_app(state.clone()), req).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub(crate) async fn send_raw(app: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

/// Provider that replays fixed chunks, optionally failing after `fail_after` of them.
pub(crate) struct ScriptedProvider {
    pub chunks: Vec<&'static str>,
    pub fail_after: Option<usize>,
}

impl ScriptedProvider {
    pub fn ok(chunks: Vec<&'static str>) -> Arc<dyn TextGenerator> {
        Arc::new(Self {
            chunks,
            fail_after: None,
        })
    }

    pub fn failing_after(chunks: Vec<&'static str>, n: usize) -> Arc<dyn TextGenerator> {
        Arc::new(Self {
            chunks,
            fail_after: Some(n),
        })
    }
}

#[async_trait]
impl TextGenerator for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, _topic: &str) -> Result<Draft, ProviderError> {
        if self.fail_after.is_some() {
            return Err(ProviderError::Status {
                status: 503,
                body: "upstream unavailable".into(),
            });
        }
        Ok(Draft {
            title: None,
            content: self.chunks.concat(),
        })
    }

    async fn generate_stream(&self, _topic: &str) -> Result<ChunkStream, ProviderError> {
        let mut items: Vec<Result<String, ProviderError>> =
            self.chunks.iter().map(|c| Ok(c.to_string())).collect();
        if let Some(n) = self.fail_after {
            items.truncate(n);
            items.push(Err(ProviderError::Malformed("connection reset".into())));
        }
        Ok(stream::iter(items).boxed())
    }
}

/// In-memory state whose orchestrator uses `provider`.
pub(crate) fn state_with(provider: Arc<dyn TextGenerator>) -> AppState {
    state_in_env(RuntimeEnv::Development, provider)
}

pub(crate) fn state_in_env(env: RuntimeEnv, provider: Arc<dyn TextGenerator>) -> AppState {
    let config = AppConfig {
        env,
        ..AppConfig::for_tests()
    };
    AppState::from_parts(Arc::new(config), Arc::new(MemoryStore::new()), provider)
}
