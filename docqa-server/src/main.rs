use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use docqa_rag::{
    AnswerGenerator, DocumentStore, FlatStore, LexicalStore, MockGenerator,
    OpenAiEmbeddingProvider, OpenAiGenerator, QaPipeline, SentenceChunker, Settings, StoreBackend,
};
use docqa_server::{AppState, ServerConfig, run_server};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env().context("invalid configuration")?;
    let pipeline = build_pipeline(&settings).await?;

    info!(
        backend = ?settings.store_backend,
        collection = %settings.collection_name,
        "starting DocQA server"
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        app_name: settings.app_name.clone(),
        app_version: settings.app_version.clone(),
    };

    run_server(ServerConfig { host: settings.host.clone(), port: settings.port }, state).await
}

/// Construct the pipeline from configuration: pick the store backend and
/// the generator, injecting every collaborator explicitly.
async fn build_pipeline(settings: &Settings) -> anyhow::Result<QaPipeline> {
    let store: Arc<dyn DocumentStore> = match settings.store_backend {
        StoreBackend::Lexical => {
            Arc::new(LexicalStore::open(&settings.data_dir, &settings.collection_name))
        }
        StoreBackend::Flat => {
            let provider = embedding_provider(settings)?;
            Arc::new(FlatStore::open(&settings.data_dir, &settings.collection_name, provider))
        }
        #[cfg(feature = "qdrant")]
        StoreBackend::Qdrant => {
            let provider = embedding_provider(settings)?;
            Arc::new(
                docqa_rag::QdrantStore::connect(
                    &settings.qdrant_url,
                    &settings.collection_name,
                    provider,
                )
                .await
                .context("failed to connect to qdrant")?,
            )
        }
        #[cfg(not(feature = "qdrant"))]
        StoreBackend::Qdrant => {
            anyhow::bail!("this build does not include the qdrant backend (enable the `qdrant` feature)")
        }
    };

    let generator: Arc<dyn AnswerGenerator> = if settings.use_mock_llm {
        info!("using deterministic mock generator");
        Arc::new(MockGenerator::new())
    } else {
        Arc::new(
            OpenAiGenerator::new(&settings.openai_api_key)
                .context("failed to build OpenAI generator")?
                .with_model(&settings.openai_model)
                .with_defaults(settings.max_tokens, settings.temperature),
        )
    };

    QaPipeline::builder()
        .chunker(SentenceChunker::new(settings.chunk_size, settings.chunk_overlap))
        .store(store)
        .generator(generator)
        .top_k(settings.top_k)
        .build()
        .context("failed to build pipeline")
}

fn embedding_provider(
    settings: &Settings,
) -> anyhow::Result<Arc<dyn docqa_rag::EmbeddingProvider>> {
    let provider = OpenAiEmbeddingProvider::new(&settings.openai_api_key)
        .context("failed to build OpenAI embedding provider")?
        .with_model(&settings.embedding_model, settings.embedding_dimensions)
        .with_timeout(Duration::from_secs(settings.provider_timeout_secs))
        .context("failed to configure embedding provider timeout")?;
    Ok(Arc::new(provider))
}
