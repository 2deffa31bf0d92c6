//! Per-request pipeline state.

use sabio_index::RetrievedChunk;

/// State threaded through the pipeline stages for one query.
///
/// Every field exists from the start of the request; stages fill them in as
/// the state flows through. A fresh state is built per request, so nothing
/// leaks between concurrent queries.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    /// The user's question, verbatim.
    pub query: String,
    /// Chunks retrieved as grounding context, best match first.
    pub documents: Vec<RetrievedChunk>,
    /// The generated answer. Empty until the respond stage runs.
    pub answer: String,
}

impl PipelineState {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            documents: Vec::new(),
            answer: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_empty() {
        let state = PipelineState::new("¿Cuál es la garantía?");
        assert_eq!(state.query, "¿Cuál es la garantía?");
        assert!(state.documents.is_empty());
        assert!(state.answer.is_empty());
    }
}
