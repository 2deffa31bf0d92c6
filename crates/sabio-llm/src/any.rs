//! Runtime-selected provider backend.

use crate::error::LlmError;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;
use crate::provider::{LlmProvider, Message};

/// A provider selected from configuration at startup.
///
/// The pipeline is generic over [`LlmProvider`]; this enum keeps the binary
/// monomorphic while still letting the backend be a config choice.
#[derive(Debug, Clone)]
pub enum AnyProvider {
    Ollama(OllamaProvider),
    OpenAi(OpenAiProvider),
}

impl LlmProvider for AnyProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        match self {
            Self::Ollama(p) => p.chat(messages).await,
            Self::OpenAi(p) => p.chat(messages).await,
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        match self {
            Self::Ollama(p) => p.embed(text).await,
            Self::OpenAi(p) => p.embed(text).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Ollama(p) => p.name(),
            Self::OpenAi(p) => p.name(),
        }
    }
}
