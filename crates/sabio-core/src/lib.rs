//! Query answering pipeline: retrieve context, then respond with it.

pub mod config;
pub mod pipeline;
pub mod prompt;
pub mod state;

pub use config::Config;
pub use pipeline::{AnswerQuery, PipelineError, QueryPipeline};
pub use prompt::{PromptError, PromptTemplate};
pub use state::PipelineState;
