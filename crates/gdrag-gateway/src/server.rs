use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use gdrag_core::App;
use tokio::sync::{Mutex, RwLock, watch};

use crate::error::GatewayError;
use crate::router::build_router;

#[derive(Clone)]
pub(crate) struct AppState {
    pub app: App,
    pub started_at: Instant,
    /// Held for the whole of an index run; runs must not interleave.
    pub index_lock: Arc<Mutex<()>>,
    /// Project most recently indexed through the API.
    pub project_path: Arc<RwLock<Option<PathBuf>>>,
}

impl AppState {
    pub(crate) fn new(app: App) -> Self {
        let project_path = app.config().project.path.clone();
        Self {
            app,
            started_at: Instant::now(),
            index_lock: Arc::new(Mutex::new(())),
            project_path: Arc::new(RwLock::new(project_path)),
        }
    }
}

pub struct GatewayServer {
    addr: SocketAddr,
    auth_token: Option<String>,
    max_body_size: usize,
    app: App,
    shutdown_rx: watch::Receiver<bool>,
}

impl GatewayServer {
    #[must_use]
    pub fn new(bind: &str, port: u16, app: App, shutdown_rx: watch::Receiver<bool>) -> Self {
        let addr: SocketAddr = format!("{bind}:{port}").parse().unwrap_or_else(|e| {
            tracing::warn!("invalid bind '{bind}': {e}, falling back to 127.0.0.1:{port}");
            SocketAddr::from(([127, 0, 0, 1], port))
        });

        if bind == "0.0.0.0" {
            tracing::warn!("gateway binding to 0.0.0.0, the API is reachable from other hosts");
        }

        Self {
            addr,
            auth_token: None,
            max_body_size: 10 * 1024 * 1024,
            app,
            shutdown_rx,
        }
    }

    #[must_use]
    pub fn with_auth(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Start the HTTP API.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or encounters a fatal I/O error.
    pub async fn serve(self) -> Result<(), GatewayError> {
        let state = AppState::new(self.app);
        let router = build_router(state, self.auth_token, self.max_body_size);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| GatewayError::Bind(self.addr.to_string(), e))?;
        tracing::info!("gateway listening on {}", self.addr);

        let mut shutdown_rx = self.shutdown_rx;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow_and_update() {
                    if shutdown_rx.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                tracing::info!("gateway shutting down");
            })
            .await
            .map_err(|e| GatewayError::Server(format!("{e}")))?;

        Ok(())
    }
}
