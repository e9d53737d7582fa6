//! Indexing and retrieval pipeline for Godot projects.
//!
//! Files are split into overlapping character windows, embedded, and upserted
//! into a vector store collection in batches with retry. Queries are embedded
//! per collection and returned as structured hits; [`retriever::format_context`]
//! renders them as a text block for prompts.

pub mod chunker;
pub mod docs;
pub mod error;
pub mod indexer;
pub mod retriever;
pub mod uploader;
pub mod walker;

pub use chunker::ChunkerConfig;
pub use docs::{DocsConfig, DocsScraper};
pub use error::{IndexError, Result};
pub use indexer::{IdScheme, IndexStats, Indexer, IndexerConfig};
pub use retriever::{
    CollectionContext, QueryContext, RetrievedChunk, Retriever, RulesConfig, format_context,
};
pub use uploader::{Backoff, RetryPolicy, Uploader};
pub use walker::ProjectWalker;
