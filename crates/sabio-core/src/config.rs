//! Service configuration: TOML file with environment overrides.

use std::path::Path;

use anyhow::{Context, bail};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub corpus: CorpusConfig,
    pub retrieval: RetrievalConfig,
    pub prompt: PromptConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend kind: `ollama` or `openai`.
    pub provider: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub embedding_model: String,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".into(),
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "mistral:7b".into(),
            embedding_model: "all-minilm".into(),
            temperature: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Directory of `.txt` source documents.
    pub source_dir: String,
    /// Directory where index snapshots persist.
    pub index_dir: String,
    pub chunk_max_size: usize,
    pub chunk_overlap: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            source_dir: "./corpus".into(),
            index_dir: "./data/index".into(),
            chunk_max_size: 500,
            chunk_overlap: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved per query.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PromptConfig {
    /// Custom grounding template. Must contain `{context}` and `{question}`.
    /// Falls back to the built-in Spanish template when unset.
    pub template: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Request body limit in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8080,
            max_body_size: 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting configuration is invalid.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SABIO_LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("SABIO_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("SABIO_LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("SABIO_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("SABIO_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("SABIO_SOURCE_DIR") {
            self.corpus.source_dir = v;
        }
        if let Ok(v) = std::env::var("SABIO_INDEX_DIR") {
            self.corpus.index_dir = v;
        }
        if let Ok(v) = std::env::var("SABIO_TOP_K") {
            match v.parse() {
                Ok(k) => self.retrieval.top_k = k,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid SABIO_TOP_K"),
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        match self.llm.provider.as_str() {
            "ollama" | "openai" => {}
            other => bail!("unknown llm provider {other:?}, expected \"ollama\" or \"openai\""),
        }
        if self.corpus.chunk_overlap >= self.corpus.chunk_max_size {
            bail!(
                "chunk_overlap ({}) must be smaller than chunk_max_size ({})",
                self.corpus.chunk_overlap,
                self.corpus.chunk_max_size
            );
        }
        if self.retrieval.top_k == 0 {
            bail!("top_k must be at least 1");
        }
        Ok(())
    }
}
