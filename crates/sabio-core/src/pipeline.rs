//! Fixed two-stage query pipeline: retrieve context, then respond.

use std::sync::Arc;

use crate::prompt::PromptTemplate;
use crate::state::PipelineState;
use sabio_index::{RetrievalError, Retriever, VectorStore};
use sabio_llm::LlmError;
use sabio_llm::provider::{LlmProvider, Message};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),
}

/// Anything that can answer a user query end to end.
///
/// The gateway depends on this trait rather than on the concrete pipeline,
/// so handlers are testable with a stub.
pub trait AnswerQuery: Send + Sync {
    /// Answer a query.
    ///
    /// # Errors
    ///
    /// Returns an error if any pipeline stage fails.
    fn answer(&self, query: &str) -> impl Future<Output = Result<String, PipelineError>> + Send;
}

/// One pipeline stage: takes the state, returns the state with its fields
/// filled in.
trait Stage: Send + Sync {
    fn run(
        &self,
        state: PipelineState,
    ) -> impl Future<Output = Result<PipelineState, PipelineError>> + Send;

    fn name(&self) -> &'static str;
}

/// Fills `state.documents` with the top-k chunks for the query.
struct RetrieveStage<P, V> {
    retriever: Retriever<P, V>,
    top_k: usize,
}

impl<P: LlmProvider, V: VectorStore> Stage for RetrieveStage<P, V> {
    async fn run(&self, mut state: PipelineState) -> Result<PipelineState, PipelineError> {
        state.documents = self.retriever.retrieve(&state.query, self.top_k).await?;
        Ok(state)
    }

    fn name(&self) -> &'static str {
        "retrieve"
    }
}

/// Fills `state.answer` from the grounded prompt.
struct RespondStage<P> {
    provider: Arc<P>,
    template: PromptTemplate,
}

impl<P: LlmProvider> Stage for RespondStage<P> {
    async fn run(&self, mut state: PipelineState) -> Result<PipelineState, PipelineError> {
        let prompt = self.template.render(&state.documents, &state.query);
        state.answer = self.provider.chat(&[Message::user(prompt)]).await?;
        Ok(state)
    }

    fn name(&self) -> &'static str {
        "respond"
    }
}

/// The fixed retrieve-then-respond pipeline.
///
/// Stateless across requests: each call to [`AnswerQuery::answer`] builds a
/// fresh [`PipelineState`], so a pipeline shared behind an [`Arc`] serves
/// concurrent queries without interference.
pub struct QueryPipeline<P, V> {
    retrieve: RetrieveStage<P, V>,
    respond: RespondStage<P>,
}

impl<P: LlmProvider, V: VectorStore> QueryPipeline<P, V> {
    #[must_use]
    pub fn new(
        retriever: Retriever<P, V>,
        provider: Arc<P>,
        template: PromptTemplate,
        top_k: usize,
    ) -> Self {
        Self {
            retrieve: RetrieveStage { retriever, top_k },
            respond: RespondStage { provider, template },
        }
    }
}

impl<P: LlmProvider, V: VectorStore> AnswerQuery for QueryPipeline<P, V> {
    async fn answer(&self, query: &str) -> Result<String, PipelineError> {
        let state = PipelineState::new(query);
        let state = run_stage(&self.retrieve, state).await?;
        let state = run_stage(&self.respond, state).await?;
        Ok(state.answer)
    }
}

async fn run_stage<S: Stage>(
    stage: &S,
    state: PipelineState,
) -> Result<PipelineState, PipelineError> {
    tracing::debug!(stage = stage.name(), "stage started");
    match stage.run(state).await {
        Ok(state) => {
            tracing::debug!(stage = stage.name(), "stage finished");
            Ok(state)
        }
        Err(e) => {
            tracing::error!(stage = stage.name(), error = %e, "stage failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sabio_index::chunker::ChunkerConfig;
    use sabio_index::in_memory_store::InMemoryVectorStore;
    use sabio_index::indexer::CorpusIndexer;
    use sabio_llm::mock::MockProvider;

    fn pipeline(
        store: Arc<InMemoryVectorStore>,
        provider: MockProvider,
    ) -> QueryPipeline<MockProvider, InMemoryVectorStore> {
        let provider = Arc::new(provider);
        let retriever = Retriever::new(store, Arc::clone(&provider));
        QueryPipeline::new(retriever, provider, PromptTemplate::default(), 3)
    }

    #[tokio::test]
    async fn answers_against_indexed_corpus() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("garantia.txt"),
            "La garantía de los portátiles dura dos años.",
        )
        .unwrap();

        let store = Arc::new(InMemoryVectorStore::new());
        let provider = MockProvider::with_responses(vec!["Dos años.".into()]);
        let indexer = CorpusIndexer::new(
            Arc::clone(&store),
            Arc::new(provider.clone()),
            ChunkerConfig::default(),
        );
        indexer.build(dir.path()).await.unwrap();

        let pipeline = pipeline(store, provider);
        let answer = pipeline.answer("¿Cuánto dura la garantía?").await.unwrap();
        assert_eq!(answer, "Dos años.");
    }

    #[tokio::test]
    async fn empty_index_still_answers() {
        let store = Arc::new(InMemoryVectorStore::new());
        let provider = MockProvider::with_responses(vec!["No tengo esa información.".into()]);
        let pipeline = pipeline(store, provider);
        let answer = pipeline.answer("¿Qué hay de nuevo?").await.unwrap();
        assert_eq!(answer, "No tengo esa información.");
    }

    #[tokio::test]
    async fn generation_failure_maps_to_pipeline_error() {
        let store = Arc::new(InMemoryVectorStore::new());
        let pipeline = pipeline(store, MockProvider::failing());
        let err = pipeline.answer("¿hola?").await.unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
    }

    #[tokio::test]
    async fn retrieval_failure_maps_to_pipeline_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "contenido").unwrap();

        let store = Arc::new(InMemoryVectorStore::new());
        let good = MockProvider::default();
        let indexer = CorpusIndexer::new(
            Arc::clone(&store),
            Arc::new(good),
            ChunkerConfig::default(),
        );
        indexer.build(dir.path()).await.unwrap();

        let bad = MockProvider {
            fail_embed: true,
            ..MockProvider::default()
        };
        let pipeline = pipeline(store, bad);
        let err = pipeline.answer("¿hola?").await.unwrap_err();
        assert!(matches!(err, PipelineError::Retrieval(_)));
    }
}
