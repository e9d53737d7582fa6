use std::path::{Path, PathBuf};

use axum::Json;
use axum::extract::{Multipart, Path as UrlPath, State};
use axum::response::IntoResponse;
use gdrag_index::{ChunkerConfig, IndexStats, QueryContext};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub collections: Option<Vec<String>>,
    #[serde(default)]
    pub include_rules: bool,
    /// Re-index the last indexed project before searching.
    #[serde(default)]
    pub update_project: bool,
}

#[derive(Serialize)]
struct QueryResponse {
    query: String,
    #[serde(flatten)]
    context: QueryContext,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IndexProjectRequest {
    pub project_path: PathBuf,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub chunk_overlap: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IndexDocsRequest {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
}

#[derive(Serialize)]
struct IndexResponse {
    success: bool,
    message: String,
    stats: IndexStats,
}

#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: String,
}

#[derive(Serialize)]
struct CollectionsResponse {
    success: bool,
    collections: Vec<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

pub(crate) async fn query_handler(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".into()));
    }
    let config = state.app.config();
    let limit = req.limit.unwrap_or(config.query.limit);
    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be greater than 0".into()));
    }
    let collections = req
        .collections
        .unwrap_or_else(|| config.query.collections.clone());

    if req.update_project {
        let path = state
            .project_path
            .read()
            .await
            .clone()
            .ok_or_else(|| ApiError::BadRequest("no project has been indexed yet".into()))?;
        let _guard = state.index_lock.lock().await;
        let stats = state.app.indexer().index_project(&path).await?;
        tracing::info!(
            project = %path.display(),
            files = stats.files_processed,
            "project re-indexed before query"
        );
    }

    let context = state
        .app
        .retriever()
        .retrieve(&req.query, limit, &collections, req.include_rules)
        .await;

    Ok(Json(QueryResponse {
        query: req.query,
        context,
    }))
}

pub(crate) async fn index_project_handler(
    State(state): State<AppState>,
    Json(req): Json<IndexProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let defaults = state.app.config().chunker();
    let chunker = ChunkerConfig {
        chunk_size: req.chunk_size.unwrap_or(defaults.chunk_size),
        chunk_overlap: req.chunk_overlap.unwrap_or(defaults.chunk_overlap),
        min_chunk_size: defaults.min_chunk_size,
    };
    chunker.validate()?;

    let indexer = state.app.indexer_with(chunker);
    let stats = {
        let _guard = state.index_lock.lock().await;
        indexer.index_project(&req.project_path).await?
    };
    *state.project_path.write().await = Some(req.project_path.clone());

    Ok(Json(IndexResponse {
        success: true,
        message: format!(
            "Indexed {} files from {} into {}",
            stats.files_processed,
            req.project_path.display(),
            indexer.config().project_collection
        ),
        stats,
    }))
}

pub(crate) async fn index_docs_handler(
    State(state): State<AppState>,
    body: Option<Json<IndexDocsRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let config = state.app.config();
    let version = req.version.unwrap_or_else(|| config.docs.version.clone());
    let collection = req
        .collection
        .unwrap_or_else(|| config.index.docs_collection.clone());

    let stats = {
        let _guard = state.index_lock.lock().await;
        let dir = state.app.docs_scraper()?.scrape(&version).await?;
        state.app.indexer().index_docs(&dir, &collection).await?
    };

    Ok(Json(IndexResponse {
        success: true,
        message: format!("Indexed Godot {version} docs into {collection}"),
        stats,
    }))
}

pub(crate) async fn upload_rules_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .and_then(safe_file_name)
            .ok_or_else(|| ApiError::BadRequest("missing or invalid file name".into()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let config = state.app.config();
        let upload_dir = &config.gateway.upload_dir;
        tokio::fs::create_dir_all(upload_dir).await?;
        let stored = upload_dir.join(&file_name);
        tokio::fs::write(&stored, &bytes).await?;

        let rules_path = &config.rules.path;
        if let Some(parent) = rules_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&stored, rules_path).await?;
        tracing::info!(
            file = %stored.display(),
            rules = %rules_path.display(),
            "project rules updated"
        );

        return Ok(Json(MessageResponse {
            success: true,
            message: format!("Rules file {file_name} uploaded"),
        }));
    }

    Err(ApiError::BadRequest("multipart field 'file' is required".into()))
}

pub(crate) async fn list_collections_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let collections = state.app.store().list_collections().await?;
    Ok(Json(CollectionsResponse {
        success: true,
        collections,
    }))
}

pub(crate) async fn delete_collection_handler(
    State(state): State<AppState>,
    UrlPath(name): UrlPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.app.store().delete_collection(&name).await?;
    tracing::info!(collection = %name, "collection deleted");
    Ok(Json(MessageResponse {
        success: true,
        message: format!("Collection {name} deleted"),
    }))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Final path component of an uploaded file name, if it is a plain name.
fn safe_file_name(raw: &str) -> Option<String> {
    let name = Path::new(raw.trim()).file_name()?.to_str()?;
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok",
            uptime_secs: 42,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"uptime_secs\":42"));
    }

    #[test]
    fn query_request_defaults() {
        let req: QueryRequest = serde_json::from_str(r#"{"query":"jump"}"#).unwrap();
        assert_eq!(req.query, "jump");
        assert!(req.limit.is_none());
        assert!(req.collections.is_none());
        assert!(!req.include_rules);
        assert!(!req.update_project);
    }

    #[test]
    fn query_response_flattens_context() {
        let resp = QueryResponse {
            query: "jump".into(),
            context: QueryContext {
                contexts: Vec::new(),
                rules: Some("use tabs".into()),
                requested: 2,
            },
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["query"], "jump");
        assert_eq!(json["rules"], "use tabs");
        assert!(json["contexts"].as_array().unwrap().is_empty());
        assert!(json.get("requested").is_none());
    }

    #[test]
    fn safe_file_name_strips_directories() {
        assert_eq!(safe_file_name("rules.md").as_deref(), Some("rules.md"));
        assert_eq!(
            safe_file_name("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(safe_file_name("/tmp/x/rules.md").as_deref(), Some("rules.md"));
        assert!(safe_file_name("..").is_none());
        assert!(safe_file_name("").is_none());
    }
}
