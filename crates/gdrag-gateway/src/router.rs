use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use subtle::ConstantTimeEq;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    delete_collection_handler, health_handler, index_docs_handler, index_project_handler,
    list_collections_handler, query_handler, upload_rules_handler,
};
use super::server::AppState;

#[derive(Clone)]
struct AuthConfig {
    token: Option<String>,
}

pub(crate) fn build_router(
    state: AppState,
    auth_token: Option<String>,
    max_body_size: usize,
) -> Router {
    let auth_cfg = AuthConfig { token: auth_token };

    let destructive = Router::new()
        .route("/api/collections/{name}", delete(delete_collection_handler))
        .layer(middleware::from_fn_with_state(auth_cfg, auth_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/query", post(query_handler))
        .route("/api/index-project", post(index_project_handler))
        .route("/api/index-docs", post(index_docs_handler))
        .route("/api/upload-rules", post(upload_rules_handler))
        .route("/api/collections", get(list_collections_handler))
        .merge(destructive)
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "detail": message }))).into_response()
}

async fn auth_middleware(
    axum::extract::State(cfg): axum::extract::State<AuthConfig>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(ref expected) = cfg.token else {
        return detail(
            StatusCode::FORBIDDEN,
            "destructive operations are disabled: no gateway auth token configured",
        );
    };

    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("");

    // Fixed-length digests so the comparison does not leak the token length.
    let token_hash = blake3::hash(token.as_bytes());
    let expected_hash = blake3::hash(expected.as_bytes());
    if !bool::from(token_hash.as_bytes().ct_eq(expected_hash.as_bytes())) {
        return detail(StatusCode::UNAUTHORIZED, "invalid or missing bearer token");
    }

    next.run(req).await
}
