mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.index.chunk_size == 0 {
            bail!("index.chunk_size must be greater than 0");
        }
        if self.index.chunk_overlap >= self.index.chunk_size {
            bail!(
                "index.chunk_overlap ({}) must be smaller than index.chunk_size ({})",
                self.index.chunk_overlap,
                self.index.chunk_size
            );
        }
        if self.index.batch_size == 0 {
            bail!("index.batch_size must be greater than 0");
        }
        if self.upload.max_retries == 0 {
            bail!("upload.max_retries must be at least 1");
        }
        if self.query.limit == 0 {
            bail!("query.limit must be greater than 0");
        }
        if self.index.extensions.is_empty() {
            bail!("index.extensions must not be empty");
        }
        Ok(())
    }

    #[must_use]
    pub fn chunker(&self) -> gdrag_index::ChunkerConfig {
        gdrag_index::ChunkerConfig {
            chunk_size: self.index.chunk_size,
            chunk_overlap: self.index.chunk_overlap,
            min_chunk_size: self.index.min_chunk_size,
        }
    }

    #[must_use]
    pub fn retry_policy(&self) -> gdrag_index::RetryPolicy {
        gdrag_index::RetryPolicy {
            max_attempts: self.upload.max_retries,
            delay: Duration::from_secs(self.upload.delay_secs),
            backoff: self.upload.backoff,
        }
    }

    #[must_use]
    pub fn indexer_config(&self) -> gdrag_index::IndexerConfig {
        gdrag_index::IndexerConfig {
            chunker: self.chunker(),
            batch_size: self.index.batch_size,
            extensions: self.index.extensions.clone(),
            skip_patterns: self.index.skip_dirs.clone(),
            project_collection: self.index.project_collection.clone(),
            id_scheme: self.index.id_scheme,
            retry: self.retry_policy(),
        }
    }

    #[must_use]
    pub fn rules_config(&self) -> gdrag_index::RulesConfig {
        gdrag_index::RulesConfig {
            path: self.rules.path.clone(),
            fallback_collection: self.rules.fallback_collection.clone(),
            fallback_query: self.rules.fallback_query.clone(),
        }
    }

    #[must_use]
    pub fn docs_config(&self) -> gdrag_index::DocsConfig {
        gdrag_index::DocsConfig {
            base_url: self.docs.base_url.clone(),
            cache_dir: self.docs.cache_dir.clone(),
            request_delay: Duration::from_millis(self.docs.request_delay_ms),
            timeout: Duration::from_secs(self.docs.timeout_secs),
        }
    }
}

/// Priority: `--config` flag > `GDRAG_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("GDRAG_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}
