//! Test-only mock LLM provider.

use std::sync::{Arc, Mutex};

use crate::provider::{LlmProvider, Message};

#[derive(Debug, Clone)]
pub struct MockProvider {
    pub responses: Arc<Mutex<Vec<String>>>,
    pub default_response: String,
    pub embedding: Vec<f32>,
    pub fail_chat: bool,
    pub fail_embed: bool,
    /// Milliseconds to sleep before returning a response.
    pub delay_ms: u64,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            embedding: vec![0.1; 8],
            fail_chat: false,
            fail_embed: false,
            delay_ms: 0,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }
}

impl LlmProvider for MockProvider {
    async fn chat(&self, _messages: &[Message]) -> Result<String, crate::LlmError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail_chat {
            return Err(crate::LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, crate::LlmError> {
        if self.fail_embed {
            return Err(crate::LlmError::Other("mock embedding error".into()));
        }
        Ok(self.embedding.clone())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn responses_consumed_in_order() {
        let provider = MockProvider::with_responses(vec!["uno".into(), "dos".into()]);
        assert_eq!(provider.chat(&[]).await.unwrap(), "uno");
        assert_eq!(provider.chat(&[]).await.unwrap(), "dos");
        assert_eq!(provider.chat(&[]).await.unwrap(), "mock response");
    }

    #[tokio::test]
    async fn failing_chat_errors() {
        let provider = MockProvider::failing();
        assert!(provider.chat(&[]).await.is_err());
    }

    #[tokio::test]
    async fn embed_returns_configured_vector() {
        let provider = MockProvider::default().with_embedding(vec![1.0, 0.0]);
        assert_eq!(provider.embed("texto").await.unwrap(), vec![1.0, 0.0]);
    }
}
