//! Scripted generator for tests and offline development.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use super::{ChatMessage, LlmError, TextGenerator};

pub struct MockGenerator {
    response: String,
    failing: AtomicBool,
    call_count: AtomicU32,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl MockGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            failing: AtomicBool::new(false),
            call_count: AtomicU32::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    /// Make subsequent calls fail as if the backend were down
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Messages from the most recent call
    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new("Mock response")
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn id(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(LlmError::Network("mock backend offline".to_string()));
        }
        Ok(self.response.clone())
    }
}
