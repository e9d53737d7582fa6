use std::io::Write;
use std::path::Path;

use gdrag_index::{Backoff, IdScheme};
use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 20] = [
    "GDRAG_CONFIG",
    "GDRAG_QDRANT_URL",
    "GDRAG_QDRANT_API_KEY",
    "GDRAG_EMBEDDING_PROVIDER",
    "GDRAG_EMBEDDING_BASE_URL",
    "GDRAG_EMBEDDING_MODEL",
    "GDRAG_EMBEDDING_API_KEY",
    "GDRAG_GATEWAY_BIND",
    "GDRAG_GATEWAY_PORT",
    "GDRAG_GATEWAY_TOKEN",
    "GDRAG_DOCS_CACHE_DIR",
    "GDRAG_PROJECT_PATH",
    "GDRAG_INDEX_CHUNK_SIZE",
    "GDRAG_INDEX_CHUNK_OVERLAP",
    "GDRAG_INDEX_BATCH_SIZE",
    "GDRAG_INDEX_ID_SCHEME",
    "GDRAG_UPLOAD_MAX_RETRIES",
    "GDRAG_UPLOAD_DELAY_SECS",
    "GDRAG_QUERY_LIMIT",
    "GDRAG_RULES_PATH",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert_eq!(config.qdrant.url, "http://localhost:6334");
    assert_eq!(config.embedding.provider, EmbeddingProvider::Ollama);
    assert_eq!(config.index.chunk_size, 1000);
    assert_eq!(config.index.chunk_overlap, 200);
    assert_eq!(config.index.min_chunk_size, 50);
    assert_eq!(config.index.batch_size, 10);
    assert_eq!(config.index.project_collection, "godot_game");
    assert_eq!(config.index.docs_collection, "godot_docs");
    assert_eq!(config.index.id_scheme, IdScheme::Content);
    assert_eq!(config.upload.max_retries, 3);
    assert_eq!(config.upload.delay_secs, 2);
    assert_eq!(config.query.limit, 3);
    assert_eq!(config.query.collections, vec!["godot_game", "godot_docs"]);
    assert_eq!(config.rules.path, Path::new("project_rules.md"));
    assert_eq!(config.docs.version, "stable");
    assert_eq!(config.gateway.port, 8000);
    assert!(config.gateway.auth_token.is_none());
    assert!(config.project.path.is_none());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/gdrag.toml")).unwrap();
    assert_eq!(config.index.chunk_size, 1000);
}

#[test]
#[serial]
fn parse_valid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        r#"
[qdrant]
url = "http://qdrant:6334"

[embedding]
provider = "openai"
base_url = "http://llm:8080/v1"
model = "text-embedding-3-small"

[index]
chunk_size = 500
chunk_overlap = 50
extensions = ["gd"]
id_scheme = "sequential"

[upload]
max_retries = 5
backoff = "exponential"

[query]
limit = 7
collections = ["game"]

[project]
path = "/work/game"
"#
    )
    .unwrap();

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.qdrant.url, "http://qdrant:6334");
    assert_eq!(config.embedding.provider, EmbeddingProvider::OpenAi);
    assert_eq!(config.embedding.model, "text-embedding-3-small");
    assert_eq!(config.index.chunk_size, 500);
    assert_eq!(config.index.min_chunk_size, 50);
    assert_eq!(config.index.id_scheme, IdScheme::Sequential);
    assert_eq!(config.upload.max_retries, 5);
    assert_eq!(config.upload.backoff, Backoff::Exponential);
    assert_eq!(config.query.limit, 7);
    assert_eq!(config.project.path.as_deref(), Some(Path::new("/work/game")));
    assert_eq!(config.gateway.port, 8000);
}

#[test]
#[serial]
fn invalid_toml_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[index\nchunk_size = ").unwrap();
    clear_env();
    assert!(Config::load(&path).is_err());
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("env.toml");
    std::fs::write(&path, "[index]\nchunk_size = 500\n").unwrap();

    clear_env();
    unsafe {
        std::env::set_var("GDRAG_INDEX_CHUNK_SIZE", "800");
        std::env::set_var("GDRAG_QDRANT_URL", "http://env-qdrant:6334");
        std::env::set_var("GDRAG_EMBEDDING_PROVIDER", "openai");
        std::env::set_var("GDRAG_GATEWAY_PORT", "9100");
        std::env::set_var("GDRAG_PROJECT_PATH", "/env/project");
        std::env::set_var("GDRAG_INDEX_ID_SCHEME", "sequential");
    }

    let config = Config::load(&path).unwrap();
    clear_env();

    assert_eq!(config.index.chunk_size, 800);
    assert_eq!(config.qdrant.url, "http://env-qdrant:6334");
    assert_eq!(config.embedding.provider, EmbeddingProvider::OpenAi);
    assert_eq!(config.gateway.port, 9100);
    assert_eq!(config.project.path.as_deref(), Some(Path::new("/env/project")));
    assert_eq!(config.index.id_scheme, IdScheme::Sequential);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("GDRAG_GATEWAY_PORT", "not-a-port");
        std::env::set_var("GDRAG_EMBEDDING_PROVIDER", "candle");
        std::env::set_var("GDRAG_QUERY_LIMIT", "-1");
    }
    let config = Config::load(Path::new("/nonexistent.toml")).unwrap();
    clear_env();

    assert_eq!(config.gateway.port, 8000);
    assert_eq!(config.embedding.provider, EmbeddingProvider::Ollama);
    assert_eq!(config.query.limit, 3);
}

#[test]
#[serial]
fn secrets_come_from_env_and_are_not_serialized() {
    clear_env();
    unsafe {
        std::env::set_var("GDRAG_QDRANT_API_KEY", "qdrant-secret");
        std::env::set_var("GDRAG_EMBEDDING_API_KEY", "sk-secret");
        std::env::set_var("GDRAG_GATEWAY_TOKEN", "gw-secret");
    }
    let config = Config::load(Path::new("/nonexistent.toml")).unwrap();
    clear_env();

    assert_eq!(config.qdrant.api_key.as_deref(), Some("qdrant-secret"));
    assert_eq!(config.embedding.api_key.as_deref(), Some("sk-secret"));
    assert_eq!(config.gateway.auth_token.as_deref(), Some("gw-secret"));

    let rendered = toml::to_string(&config).unwrap();
    assert!(!rendered.contains("secret"));
}

#[test]
fn validate_rejects_overlap_not_below_size() {
    let mut config = Config::default();
    config.index.chunk_overlap = config.index.chunk_size;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("chunk_overlap"));
}

#[test]
fn validate_rejects_zero_values() {
    let mut config = Config::default();
    config.index.chunk_size = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.index.batch_size = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.upload.max_retries = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.query.limit = 0;
    assert!(config.validate().is_err());
}

#[test]
fn conversions_carry_settings() {
    let mut config = Config::default();
    config.upload.delay_secs = 5;
    config.upload.backoff = Backoff::Exponential;
    config.docs.request_delay_ms = 100;

    let indexer = config.indexer_config();
    assert_eq!(indexer.chunker.chunk_size, 1000);
    assert_eq!(indexer.batch_size, 10);
    assert_eq!(indexer.project_collection, "godot_game");
    assert_eq!(indexer.retry.delay, Duration::from_secs(5));
    assert_eq!(indexer.retry.backoff, Backoff::Exponential);

    let docs = config.docs_config();
    assert_eq!(docs.request_delay, Duration::from_millis(100));

    let rules = config.rules_config();
    assert_eq!(rules.fallback_collection, "godot_game");
}

#[test]
#[serial]
fn resolve_config_path_priority() {
    clear_env();
    assert_eq!(
        resolve_config_path(Some(Path::new("cli.toml"))),
        PathBuf::from("cli.toml")
    );
    assert_eq!(resolve_config_path(None), PathBuf::from("config/default.toml"));

    unsafe { std::env::set_var("GDRAG_CONFIG", "/etc/gdrag.toml") };
    assert_eq!(resolve_config_path(None), PathBuf::from("/etc/gdrag.toml"));
    assert_eq!(
        resolve_config_path(Some(Path::new("cli.toml"))),
        PathBuf::from("cli.toml")
    );
    clear_env();
}

#[test]
fn shipped_default_config_matches_builtin_defaults() {
    let shipped: Config = toml::from_str(include_str!("../../../../config/default.toml")).unwrap();
    let builtin = Config::default();
    assert_eq!(
        toml::to_string(&shipped).unwrap(),
        toml::to_string(&builtin).unwrap()
    );
    assert!(shipped.validate().is_ok());
}
