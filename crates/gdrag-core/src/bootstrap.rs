//! Service construction: store, embedder, indexer and retriever from [`Config`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use gdrag_embed::{AnyEmbedder, OllamaEmbedder, OpenAiEmbedder};
use gdrag_index::{ChunkerConfig, DocsScraper, Indexer, Retriever};
use gdrag_store::{QdrantOps, VectorStore};

use crate::config::{Config, EmbeddingProvider};

/// Shared handles every entry point (CLI command or HTTP handler) works with.
#[derive(Clone)]
pub struct App {
    config: Config,
    store: Arc<dyn VectorStore>,
    embedder: Arc<AnyEmbedder>,
}

impl App {
    /// Validate `config` and connect the configured backends.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the Qdrant client cannot be
    /// built.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        let store = build_store(&config)?;
        let embedder = Arc::new(build_embedder(&config));
        tracing::debug!(
            qdrant = %config.qdrant.url,
            embedder = %config.embedding.model,
            "services ready"
        );
        Ok(Self {
            config,
            store,
            embedder,
        })
    }

    /// Assemble from prebuilt parts, skipping validation and connection.
    #[must_use]
    pub fn with_parts(
        config: Config,
        store: Arc<dyn VectorStore>,
        embedder: Arc<AnyEmbedder>,
    ) -> Self {
        Self {
            config,
            store,
            embedder,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    #[must_use]
    pub fn embedder(&self) -> &Arc<AnyEmbedder> {
        &self.embedder
    }

    #[must_use]
    pub fn indexer(&self) -> Indexer<AnyEmbedder> {
        self.indexer_with(self.config.chunker())
    }

    /// Indexer using `chunker` in place of the configured chunk settings.
    #[must_use]
    pub fn indexer_with(&self, chunker: ChunkerConfig) -> Indexer<AnyEmbedder> {
        let mut config = self.config.indexer_config();
        config.chunker = chunker;
        Indexer::new(Arc::clone(&self.store), Arc::clone(&self.embedder), config)
    }

    #[must_use]
    pub fn retriever(&self) -> Retriever<AnyEmbedder> {
        Retriever::new(
            Arc::clone(&self.store),
            Arc::clone(&self.embedder),
            self.config.rules_config(),
        )
    }

    /// # Errors
    ///
    /// Returns an error if the scraper's HTTP client cannot be built.
    pub fn docs_scraper(&self) -> gdrag_index::Result<DocsScraper> {
        DocsScraper::new(self.config.docs_config())
    }
}

/// # Errors
///
/// Returns an error if the Qdrant client cannot be created.
pub fn build_store(config: &Config) -> anyhow::Result<Arc<dyn VectorStore>> {
    let ops = QdrantOps::new(&config.qdrant.url, config.qdrant.api_key.as_deref())
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("failed to connect to Qdrant at {}", config.qdrant.url))?;
    Ok(Arc::new(ops))
}

#[must_use]
pub fn build_embedder(config: &Config) -> AnyEmbedder {
    let e = &config.embedding;
    match e.provider {
        EmbeddingProvider::Ollama => AnyEmbedder::Ollama(
            OllamaEmbedder::new(&e.base_url, e.model.clone())
                .with_timeout(Duration::from_secs(e.timeout_secs)),
        ),
        EmbeddingProvider::OpenAi => AnyEmbedder::OpenAi(OpenAiEmbedder::new(
            e.api_key.clone(),
            &e.base_url,
            e.model.clone(),
            Duration::from_secs(e.timeout_secs),
        )),
    }
}

#[cfg(test)]
mod tests {
    use gdrag_embed::Embedder;

    use super::*;

    #[test]
    fn build_embedder_follows_provider() {
        let mut config = Config::default();
        assert_eq!(build_embedder(&config).name(), "ollama");

        config.embedding.provider = EmbeddingProvider::OpenAi;
        config.embedding.base_url = "http://localhost:8080/v1".into();
        assert_eq!(build_embedder(&config).name(), "openai");
    }

    #[tokio::test]
    async fn from_config_rejects_invalid_chunking() {
        let mut config = Config::default();
        config.index.chunk_overlap = 2000;
        assert!(App::from_config(config).is_err());
    }

    #[tokio::test]
    async fn indexer_with_overrides_chunker_only() {
        let app = App::from_config(Config::default()).unwrap();
        let chunker = ChunkerConfig {
            chunk_size: 300,
            chunk_overlap: 30,
            min_chunk_size: 10,
        };
        let indexer = app.indexer_with(chunker);
        assert_eq!(indexer.config().chunker, chunker);
        assert_eq!(indexer.config().batch_size, 10);
        assert_eq!(indexer.config().project_collection, "godot_game");
    }
}
