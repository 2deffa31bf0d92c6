use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tokio::sync::watch;

use sabio_core::config::Config;
use sabio_core::pipeline::QueryPipeline;
use sabio_core::prompt::PromptTemplate;
use sabio_gateway::GatewayServer;
use sabio_index::chunker::ChunkerConfig;
use sabio_index::disk_store::DiskVectorStore;
use sabio_index::indexer::{CHUNK_COLLECTION, CorpusIndexer};
use sabio_index::retriever::Retriever;
use sabio_index::vector_store::VectorStore;
use sabio_llm::any::AnyProvider;
use sabio_llm::ollama::OllamaProvider;
use sabio_llm::openai::OpenAiProvider;

#[derive(Parser)]
#[command(name = "sabio", about = "Retrieval-augmented question answering over a document corpus")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "sabio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Index the corpus and exit.
    Ingest,
    /// Serve the query API (default). Ingests first if no index exists.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Ingest => ingest(&config).await,
        Command::Serve => serve(&config).await,
    }
}

fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    match config.llm.provider.as_str() {
        "ollama" => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &config.llm.base_url,
            config.llm.model.clone(),
            config.llm.embedding_model.clone(),
            config.llm.temperature,
        ))),
        "openai" => {
            let Some(api_key) = config.llm.api_key.clone() else {
                bail!("llm.api_key is required for the openai provider");
            };
            Ok(AnyProvider::OpenAi(OpenAiProvider::new(
                api_key,
                config.llm.base_url.clone(),
                config.llm.model.clone(),
                Some(config.llm.embedding_model.clone()),
                config.llm.temperature,
            )))
        }
        other => bail!("unknown llm provider {other:?}"),
    }
}

fn build_indexer(
    store: Arc<DiskVectorStore>,
    provider: Arc<AnyProvider>,
    config: &Config,
) -> CorpusIndexer<AnyProvider, DiskVectorStore> {
    CorpusIndexer::new(
        store,
        provider,
        ChunkerConfig {
            max_size: config.corpus.chunk_max_size,
            overlap: config.corpus.chunk_overlap,
        },
    )
}

async fn ingest(config: &Config) -> anyhow::Result<()> {
    let provider = Arc::new(create_provider(config)?);
    let store =
        Arc::new(DiskVectorStore::open(&config.corpus.index_dir).context("opening index")?);

    let report = build_indexer(store, provider, config)
        .build(Path::new(&config.corpus.source_dir))
        .await
        .context("ingestion failed")?;

    tracing::info!(
        documents = report.documents_loaded,
        chunks = report.chunks_indexed,
        duration_ms = report.duration_ms,
        "corpus indexed"
    );
    Ok(())
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let provider = Arc::new(create_provider(config)?);
    if let AnyProvider::Ollama(p) = provider.as_ref() {
        p.health_check().await?;
    }

    let store =
        Arc::new(DiskVectorStore::open(&config.corpus.index_dir).context("opening index")?);

    if !store.collection_exists(CHUNK_COLLECTION).await? {
        tracing::info!("no existing index, ingesting corpus first");
        build_indexer(Arc::clone(&store), Arc::clone(&provider), config)
            .build(Path::new(&config.corpus.source_dir))
            .await
            .context("ingestion failed")?;
    }

    let template = match &config.prompt.template {
        Some(t) => PromptTemplate::new(t.clone()).context("invalid prompt template")?,
        None => PromptTemplate::default(),
    };

    let retriever = Retriever::new(store, Arc::clone(&provider));
    let pipeline = Arc::new(QueryPipeline::new(
        retriever,
        provider,
        template,
        config.retrieval.top_k,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    GatewayServer::new(
        &config.server.bind,
        config.server.port,
        pipeline,
        shutdown_rx,
    )
    .with_max_body_size(config.server.max_body_size)
    .serve()
    .await?;

    Ok(())
}
