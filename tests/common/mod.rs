#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use hydralearn_api::auth::SessionCodec;
use hydralearn_api::config::AppConfig;
use hydralearn_api::database::{MemoryStore, Role, Store, UpsertUser, User};
use hydralearn_api::handlers::app_registry;
use hydralearn_api::llm::MockGenerator;
use hydralearn_api::rpc::Dispatcher;
use hydralearn_api::server::{self, ServerState};
use hydralearn_api::state::AppState;

pub const GENERATED_TEXT: &str = "Objectives: understand photosynthesis. Activities: leaf walk.";

/// The full router over an in-memory store and a scripted generator, driven in-process
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub llm: Arc<MockGenerator>,
    pub sessions: Arc<SessionCodec>,
    pub config: AppConfig,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Error code of a failed call
    pub fn code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn is_success(&self) -> bool {
        self.body["success"] == Value::Bool(true)
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::development())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let llm = Arc::new(MockGenerator::new(GENERATED_TEXT));
        let sessions = SessionCodec::new(&config.session, &config.oauth.app_id)
            .expect("test session config is valid");

        let state = AppState::new(store.clone(), llm.clone(), config.clone(), sessions);
        let sessions = state.sessions.clone();
        let dispatcher = Dispatcher::new(app_registry().expect("registry builds"), state);
        let router = server::router(ServerState::new(dispatcher, None));

        Self {
            router,
            store,
            llm,
            sessions,
            config,
        }
    }

    pub async fn seed_user(&self, open_id: &str, role: Role) -> Result<User> {
        let user = self
            .store
            .upsert_user(UpsertUser {
                open_id: open_id.to_string(),
                name: Some(format!("{} ({})", open_id, role.as_str())),
                role: Some(role),
                ..Default::default()
            })
            .await?;
        Ok(user)
    }

    /// `Cookie` header value carrying a valid session for `user`
    pub fn session_for(&self, user: &User) -> Result<String> {
        let token = self
            .sessions
            .issue(&user.open_id, user.name.as_deref().unwrap_or_default())?;
        Ok(format!("{}={}", self.sessions.cookie_name(), token))
    }

    /// POST /api/rpc/:procedure
    pub async fn call(&self, procedure: &str, input: Value, cookie: Option<&str>) -> Result<TestResponse> {
        let body = serde_json::to_vec(&input)?;
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/rpc/{}", procedure))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body))?).await
    }

    /// GET /api/rpc/:procedure?input=<json>
    pub async fn query(&self, procedure: &str, input: Option<Value>, cookie: Option<&str>) -> Result<TestResponse> {
        let mut uri = format!("/api/rpc/{}", procedure);
        if let Some(input) = input {
            let encoded: String = url::form_urlencoded::byte_serialize(input.to_string().as_bytes()).collect();
            uri = format!("{}?input={}", uri, encoded);
        }

        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty())?).await
    }

    pub async fn get(&self, path: &str) -> Result<TestResponse> {
        let request = Request::builder().method(Method::GET).uri(path).body(Body::empty())?;
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("router call failed")?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };

        Ok(TestResponse { status, headers, body })
    }
}
