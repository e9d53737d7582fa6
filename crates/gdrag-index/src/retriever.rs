//! Multi-collection retrieval returning structured hits, plus the text
//! rendering used by the CLI.

use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;

use gdrag_embed::Embedder;
use gdrag_store::{ScoredVectorPoint, VectorStore};
use serde::Serialize;

use crate::error::Result;

pub const RULES_HEADER: &str = "--- PROJECT RULES ---";

/// Where project rules come from when a query asks for them.
#[derive(Debug, Clone)]
pub struct RulesConfig {
    /// Local rules file, preferred when present and non-blank.
    pub path: PathBuf,
    /// Collection searched when the rules file is missing.
    pub fallback_collection: String,
    pub fallback_query: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("project_rules.md"),
            fallback_collection: "godot_game".into(),
            fallback_query: "project rules and coding guidelines".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub source: String,
    pub text: String,
    pub score: f32,
}

impl From<ScoredVectorPoint> for RetrievedChunk {
    fn from(point: ScoredVectorPoint) -> Self {
        let source = match point.payload_str("source") {
            "" => "unknown".to_owned(),
            s => s.to_owned(),
        };
        let text = match point.payload_str("text") {
            "" => "No text available".to_owned(),
            s => s.to_owned(),
        };
        Self {
            source,
            text,
            score: point.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionContext {
    pub collection: String,
    /// Highest score first.
    pub results: Vec<RetrievedChunk>,
}

/// Everything retrieved for one query. Collections that failed or returned
/// nothing are absent from `contexts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryContext {
    pub contexts: Vec<CollectionContext>,
    pub rules: Option<String>,
    /// Number of collections the caller asked for; drives per-collection
    /// headers when rendering.
    #[serde(skip)]
    pub requested: usize,
}

impl QueryContext {
    /// True when there is nothing to show: no hits and no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_none() && self.contexts.iter().all(|c| c.results.is_empty())
    }
}

pub struct Retriever<E: Embedder> {
    store: Arc<dyn VectorStore>,
    embedder: Arc<E>,
    rules: RulesConfig,
}

impl<E: Embedder> Retriever<E> {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<E>, rules: RulesConfig) -> Self {
        Self {
            store,
            embedder,
            rules,
        }
    }

    /// Search every collection for `query`, keeping the top `limit` hits of each.
    ///
    /// Never fails: a collection that errors is logged and left out.
    pub async fn retrieve(
        &self,
        query: &str,
        limit: u64,
        collections: &[String],
        include_rules: bool,
    ) -> QueryContext {
        let rules = if include_rules {
            self.load_rules().await
        } else {
            None
        };

        let mut contexts = Vec::with_capacity(collections.len());
        for collection in collections {
            match self.search(collection, query, limit).await {
                Ok(results) if results.is_empty() => {
                    tracing::debug!(collection = %collection, "no results");
                }
                Ok(results) => contexts.push(CollectionContext {
                    collection: collection.clone(),
                    results,
                }),
                Err(e) => {
                    tracing::warn!(collection = %collection, "query failed: {e:#}");
                }
            }
        }

        QueryContext {
            contexts,
            rules,
            requested: collections.len(),
        }
    }

    async fn search(
        &self,
        collection: &str,
        query: &str,
        limit: u64,
    ) -> Result<Vec<RetrievedChunk>> {
        let vector = self.embedder.embed(query).await?;
        let hits = self.store.search(collection, vector, limit).await?;
        Ok(hits.into_iter().map(RetrievedChunk::from).collect())
    }

    /// Rules file contents, else the best match for the fallback phrase.
    async fn load_rules(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.rules.path).await {
            Ok(text) if !text.trim().is_empty() => return Some(text),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.rules.path.display(), "cannot read rules file: {e}");
            }
        }

        match self
            .search(
                &self.rules.fallback_collection,
                &self.rules.fallback_query,
                1,
            )
            .await
        {
            Ok(mut hits) if !hits.is_empty() => Some(hits.swap_remove(0).text),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(
                    collection = %self.rules.fallback_collection,
                    "rules lookup failed: {e:#}"
                );
                None
            }
        }
    }
}

/// Render a context block. Empty when there is nothing to show.
#[must_use]
pub fn format_context(ctx: &QueryContext) -> String {
    let mut out = String::new();

    if let Some(rules) = &ctx.rules {
        let _ = writeln!(out, "{RULES_HEADER}\n{}", rules.trim_end());
    }

    for collection in ctx.contexts.iter().filter(|c| !c.results.is_empty()) {
        if ctx.requested > 1 {
            let _ = writeln!(
                out,
                "\n--- CONTEXT FROM {} ---",
                collection.collection.to_uppercase()
            );
        }
        for hit in &collection.results {
            let _ = write!(
                out,
                "\n--- From {} ---\n{}\n(Relevance score: {:.4})\n",
                hit.source, hit.text, hit.score
            );
        }
    }

    out
}
