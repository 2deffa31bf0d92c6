//! OpenAI-compatible backend over `/chat/completions` and `/embeddings`.
//!
//! Works against any endpoint speaking the OpenAI wire format, including
//! hosted gateways and Ollama's `/v1` surface.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message, Role};

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl Clone for OpenAiProvider {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            embedding_model: self.embedding_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(
        api_key: String,
        mut base_url: String,
        model: String,
        embedding_model: Option<String>,
        temperature: f32,
    ) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url,
            model,
            embedding_model,
            temperature,
            max_tokens: 1024,
        }
    }

}

impl LlmProvider for OpenAiProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let api_messages: Vec<ApiMessage<'_>> = messages.iter().map(convert_message).collect();
        let body = ChatRequest {
            model: &self.model,
            messages: &api_messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.map_err(LlmError::Http)?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            tracing::error!("chat completion failed with status {status}: {text}");
            return Err(LlmError::Other(format!(
                "chat completion request failed (status {status})"
            )));
        }

        let resp: ChatResponse = serde_json::from_str(&text)?;

        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse { provider: "openai" })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let Some(ref embedding_model) = self.embedding_model else {
            return Err(LlmError::EmbedUnsupported { provider: "openai" });
        };

        let body = EmbeddingsRequest {
            model: embedding_model,
            input: text,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.map_err(LlmError::Http)?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            tracing::error!("embedding request failed with status {status}: {text}");
            return Err(LlmError::Other(format!(
                "embedding request failed (status {status})"
            )));
        }

        let resp: EmbeddingsResponse = serde_json::from_str(&text)?;

        resp.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(LlmError::EmptyResponse { provider: "openai" })
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "openai"
    }
}

fn convert_message(msg: &Message) -> ApiMessage<'_> {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    };
    ApiMessage {
        role,
        content: &msg.content,
    }
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage<'a>],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slashes_stripped() {
        let p = OpenAiProvider::new(
            "key".into(),
            "https://api.example.com/v1///".into(),
            "gpt-4o-mini".into(),
            None,
            0.1,
        );
        assert_eq!(p.base_url, "https://api.example.com/v1");
    }

    #[test]
    fn chat_request_serializes_temperature() {
        let messages = [ApiMessage {
            role: "user",
            content: "hola",
        }];
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            max_tokens: 1024,
            temperature: 0.1,
            stream: false,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"temperature\":0.1"));
        assert!(json.contains("\"stream\":false"));
    }

    #[test]
    fn chat_response_parses() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"2 years."}}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.choices[0].message.content, "2 years.");
    }

    #[test]
    fn embeddings_response_parses() {
        let json = r#"{"data":[{"embedding":[0.1,0.2,0.3]}]}"#;
        let resp: EmbeddingsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data[0].embedding.len(), 3);
    }

    #[tokio::test]
    async fn embed_without_model_is_unsupported() {
        let p = OpenAiProvider::new(
            "key".into(),
            "https://api.example.com/v1".into(),
            "gpt-4o-mini".into(),
            None,
            0.1,
        );
        let err = p.embed("texto").await.unwrap_err();
        assert!(matches!(err, LlmError::EmbedUnsupported { .. }));
    }

    #[test]
    fn debug_redacts_api_key() {
        let p = OpenAiProvider::new(
            "secret".into(),
            "https://api.example.com".into(),
            "m".into(),
            None,
            0.1,
        );
        let dbg = format!("{p:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
