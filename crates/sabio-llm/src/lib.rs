//! LLM provider abstraction and backend implementations.

pub mod any;
pub mod error;
mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;

pub use error::LlmError;
pub use provider::LlmProvider;
