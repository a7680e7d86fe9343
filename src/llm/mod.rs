//! Text-generation collaborator.
//!
//! Procedures only ever see [`TextGenerator`]; the OpenAI-compatible client is the production
//! backend and [`MockGenerator`] scripts responses in tests.

pub mod mock;
pub mod openai;
pub mod prompts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use mock::MockGenerator;
pub use openai::OpenAiCompatible;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// No backend configured, or the backend refused service
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Non-success HTTP status from the backend
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The backend answered without any content
    #[error("Backend returned an empty response")]
    EmptyResponse,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The spawned generation task panicked or was aborted
    #[error("Generation task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend identifier for logs (usually the model name)
    fn id(&self) -> &str;

    /// Single non-streaming completion; returns the first choice's text
    async fn generate(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError>;
}

/// Run a generation on its own task and wait for it. If the caller is dropped mid-request the
/// task still finishes and its output is discarded.
pub async fn generate_detached(
    generator: Arc<dyn TextGenerator>,
    messages: Vec<ChatMessage>,
) -> Result<String, LlmError> {
    let backend = generator.id().to_string();
    let started = std::time::Instant::now();

    let result = tokio::spawn(async move { generator.generate(messages).await })
        .await
        .map_err(|e| LlmError::Task(e.to_string()))?;

    match &result {
        Ok(text) => tracing::debug!(
            backend = %backend,
            chars = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Text generation finished"
        ),
        Err(e) => tracing::warn!(backend = %backend, error = %e, "Text generation failed"),
    }

    result
}

/// Stand-in used when no backend URL is configured
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    fn id(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        Err(LlmError::Unavailable("no text-generation backend configured".to_string()))
    }
}
