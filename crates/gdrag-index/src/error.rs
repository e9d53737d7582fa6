//! Error types for gdrag-index.

use std::path::PathBuf;

/// Errors that can occur while indexing, retrieving or scraping.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error reading source files or writing the docs cache.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding backend error.
    #[error("embedding error: {0}")]
    Embed(#[from] gdrag_embed::EmbedError),

    /// Vector store error.
    #[error("vector store error: {0}")]
    Store(#[from] gdrag_store::VectorStoreError),

    /// Chunk window parameters that cannot make forward progress.
    #[error("invalid chunking: overlap {overlap} must be smaller than chunk size {size}")]
    InvalidChunking { size: usize, overlap: usize },

    /// Root path to index is missing or not a directory.
    #[error("not a directory: {}", .0.display())]
    InvalidPath(PathBuf),

    /// HTTP error while scraping documentation.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed URL in the docs configuration or a scraped page.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("scrape failed: {0}")]
    Scrape(String),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
