#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("empty embedding from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("{provider} returned status {status}")]
    Status {
        provider: &'static str,
        status: u16,
    },

    #[error("{provider} did not answer within {after:?}")]
    Timeout {
        provider: &'static str,
        after: std::time::Duration,
    },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, EmbedError>;
