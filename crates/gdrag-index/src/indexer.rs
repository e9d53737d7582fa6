//! Indexing orchestrator: walk → chunk → embed → upload, with full refresh of
//! the target collection on every run.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use gdrag_embed::Embedder;
use gdrag_store::{Payload, VectorPoint, VectorStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chunker::{Chunk, ChunkerConfig, chunk_file};
use crate::error::{IndexError, Result};
use crate::uploader::{RetryPolicy, Uploader};
use crate::walker::{
    DEFAULT_SKIP_PATTERNS, ProjectWalker, normalize_extensions, read_lossy, relative_path,
};

/// Extensions indexed by `index_project` when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["gd", "cs", "tscn", "tres", "gdshader", "md", "txt"];

/// How point ids are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    /// UUIDv5 of collection, source, chunk index and text. Stable across runs.
    #[default]
    Content,
    /// Running counter of chunks created in this run.
    Sequential,
}

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub chunker: ChunkerConfig,
    /// Files per upload batch (default: 10).
    pub batch_size: usize,
    pub extensions: Vec<String>,
    pub skip_patterns: Vec<String>,
    pub project_collection: String,
    pub id_scheme: IdScheme,
    pub retry: RetryPolicy,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            batch_size: 10,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_owned()).collect(),
            skip_patterns: DEFAULT_SKIP_PATTERNS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            project_collection: "godot_game".into(),
            id_scheme: IdScheme::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Summary of an indexing run. `errors > 0` means some files or batches were
/// dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub files_processed: usize,
    pub chunks_created: usize,
    pub errors: usize,
    pub duration_ms: u64,
}

pub struct Indexer<E: Embedder> {
    store: Arc<dyn VectorStore>,
    embedder: Arc<E>,
    uploader: Uploader,
    walker: ProjectWalker,
    config: IndexerConfig,
}

impl<E: Embedder> Indexer<E> {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<E>, config: IndexerConfig) -> Self {
        let uploader = Uploader::new(Arc::clone(&store), config.retry);
        let walker = ProjectWalker::new(config.extensions.clone(), config.skip_patterns.clone());
        Self {
            store,
            embedder,
            uploader,
            walker,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Index a Godot project into the configured project collection.
    ///
    /// # Errors
    ///
    /// See [`Indexer::index_tree`].
    pub async fn index_project(&self, root: &Path) -> Result<IndexStats> {
        let extensions = self.walker.extensions().to_vec();
        self.index_tree(root, &extensions, &self.config.project_collection)
            .await
    }

    /// Index a directory of scraped `.txt` documentation pages.
    ///
    /// # Errors
    ///
    /// See [`Indexer::index_tree`].
    pub async fn index_docs(&self, dir: &Path, collection: &str) -> Result<IndexStats> {
        self.index_tree(dir, &["txt".to_owned()], collection).await
    }

    /// Replace the contents of `collection` with the chunks of every file under
    /// `root` matching `extensions`.
    ///
    /// Per-file and per-batch failures are counted in [`IndexStats::errors`]
    /// and do not abort the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunker config is invalid, `root` is not a
    /// directory, or the collection cannot be created or truncated.
    pub async fn index_tree(
        &self,
        root: &Path,
        extensions: &[String],
        collection: &str,
    ) -> Result<IndexStats> {
        let start = Instant::now();
        self.config.chunker.validate()?;
        if !root.is_dir() {
            return Err(IndexError::InvalidPath(root.to_path_buf()));
        }

        self.ensure_collection(collection).await?;
        self.store.truncate(collection).await?;

        let mut stats = IndexStats::default();
        let batch_size = self.config.batch_size.max(1);

        for ext in &normalize_extensions(extensions) {
            let files = self.walker.discover(root, ext);
            tracing::info!(ext = %ext, files = files.len(), collection, "indexing extension");

            for batch in files.chunks(batch_size) {
                let mut points = Vec::new();

                for path in batch {
                    let rel_path = relative_path(root, path);
                    match self
                        .process_file(path, &rel_path, collection, stats.chunks_created)
                        .await
                    {
                        Ok(None) => {
                            tracing::debug!(file = %rel_path, "skipping empty file");
                        }
                        Ok(Some(file_points)) => {
                            stats.files_processed += 1;
                            stats.chunks_created += file_points.len();
                            tracing::debug!(file = %rel_path, chunks = file_points.len());
                            points.extend(file_points);
                        }
                        Err(e) => {
                            stats.errors += 1;
                            tracing::warn!(file = %rel_path, "failed to index file: {e:#}");
                        }
                    }
                }

                if !self.uploader.upload(collection, points).await {
                    stats.errors += 1;
                }
            }
        }

        stats.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        tracing::info!(
            collection,
            files = stats.files_processed,
            chunks = stats.chunks_created,
            errors = stats.errors,
            duration_ms = stats.duration_ms,
            "indexing complete"
        );
        Ok(stats)
    }

    async fn ensure_collection(&self, collection: &str) -> Result<()> {
        let existing = self.store.list_collections().await?;
        if existing.iter().any(|name| name == collection) {
            return Ok(());
        }
        let dimension = self.embedder.probe_dimension().await?;
        tracing::info!(collection, dimension, "creating collection");
        self.store.create_collection(collection, dimension).await?;
        Ok(())
    }

    /// `Ok(None)` for blank files. Any embed failure discards the whole file.
    async fn process_file(
        &self,
        path: &Path,
        rel_path: &str,
        collection: &str,
        next_id: usize,
    ) -> Result<Option<Vec<VectorPoint>>> {
        let content = read_lossy(path).await?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let chunks = chunk_file(&content, rel_path, &self.config.chunker);
        let mut points = Vec::with_capacity(chunks.len());
        for (offset, chunk) in chunks.into_iter().enumerate() {
            let vector = self.embedder.embed(&chunk.text).await?;
            let id = match self.config.id_scheme {
                IdScheme::Sequential => (next_id + offset).to_string(),
                IdScheme::Content => content_id(collection, &chunk),
            };
            points.push(VectorPoint {
                id,
                vector,
                payload: chunk_payload(chunk),
            });
        }
        Ok(Some(points))
    }
}

fn content_id(collection: &str, chunk: &Chunk) -> String {
    let key = format!(
        "{collection}\0{}\0{}\0{}",
        chunk.source, chunk.index, chunk.text
    );
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}

fn chunk_payload(chunk: Chunk) -> Payload {
    let mut payload = Payload::new();
    payload.insert("source".into(), chunk.source.into());
    payload.insert("text".into(), chunk.text.into());
    payload.insert("chunk_index".into(), chunk.index.into());
    payload.insert("total_chunks".into(), chunk.total.into());
    payload.insert("file_type".into(), chunk.file_type.into());
    payload
}
