use std::path::PathBuf;

use gdrag_index::{Backoff, IdScheme};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub qdrant: QdrantConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub project: ProjectConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QdrantConfig {
    /// gRPC endpoint.
    #[serde(default = "default_qdrant_url")]
    pub url: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            api_key: None,
        }
    }
}

/// Embedding backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Ollama,
    OpenAi,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_embedding_model() -> String {
    "all-minilm".into()
}

fn default_embedding_timeout() -> u64 {
    30
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            api_key: None,
            timeout_secs: default_embedding_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Substrings of relative paths to leave out.
    #[serde(default = "default_skip_dirs")]
    pub skip_dirs: Vec<String>,
    #[serde(default = "default_project_collection")]
    pub project_collection: String,
    #[serde(default = "default_docs_collection")]
    pub docs_collection: String,
    #[serde(default)]
    pub id_scheme: IdScheme,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_min_chunk_size() -> usize {
    50
}

fn default_batch_size() -> usize {
    10
}

fn default_extensions() -> Vec<String> {
    gdrag_index::indexer::DEFAULT_EXTENSIONS
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

fn default_skip_dirs() -> Vec<String> {
    gdrag_index::walker::DEFAULT_SKIP_PATTERNS
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

pub(crate) fn default_project_collection() -> String {
    "godot_game".into()
}

pub(crate) fn default_docs_collection() -> String {
    "godot_docs".into()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_size: default_min_chunk_size(),
            batch_size: default_batch_size(),
            extensions: default_extensions(),
            skip_dirs: default_skip_dirs(),
            project_collection: default_project_collection(),
            docs_collection: default_docs_collection(),
            id_scheme: IdScheme::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Total upsert attempts per batch.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
    #[serde(default)]
    pub backoff: Backoff,
}

fn default_max_retries() -> u32 {
    3
}

fn default_delay_secs() -> u64 {
    2
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_secs: default_delay_secs(),
            backoff: Backoff::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    #[serde(default = "default_query_limit")]
    pub limit: u64,
    #[serde(default = "default_query_collections")]
    pub collections: Vec<String>,
}

fn default_query_limit() -> u64 {
    3
}

fn default_query_collections() -> Vec<String> {
    vec![default_project_collection(), default_docs_collection()]
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            limit: default_query_limit(),
            collections: default_query_collections(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RulesConfig {
    #[serde(default = "default_rules_path")]
    pub path: PathBuf,
    #[serde(default = "default_project_collection")]
    pub fallback_collection: String,
    #[serde(default = "default_fallback_query")]
    pub fallback_query: String,
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("project_rules.md")
}

fn default_fallback_query() -> String {
    "project rules and coding guidelines".into()
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: default_rules_path(),
            fallback_collection: default_project_collection(),
            fallback_query: default_fallback_query(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocsConfig {
    #[serde(default = "default_docs_base_url")]
    pub base_url: String,
    #[serde(default = "default_docs_version")]
    pub version: String,
    /// Parent of the `godot_docs_<version>` directories.
    #[serde(default = "default_docs_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_docs_timeout")]
    pub timeout_secs: u64,
}

fn default_docs_base_url() -> String {
    "https://docs.godotengine.org/en".into()
}

fn default_docs_version() -> String {
    "stable".into()
}

fn default_docs_cache_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_docs_timeout() -> u64 {
    30
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            base_url: default_docs_base_url(),
            version: default_docs_version(),
            cache_dir: default_docs_cache_dir(),
            request_delay_ms: default_request_delay_ms(),
            timeout_secs: default_docs_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Bearer token for destructive routes. Without it those routes answer 403.
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,
    #[serde(default = "default_gateway_max_body")]
    pub max_body_size: usize,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

fn default_gateway_bind() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_gateway_max_body() -> usize {
    10 * 1024 * 1024
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_gateway_bind(),
            port: default_gateway_port(),
            auth_token: None,
            max_body_size: default_gateway_max_body(),
            upload_dir: default_upload_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// Godot project re-indexed by `query --update-project`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}
