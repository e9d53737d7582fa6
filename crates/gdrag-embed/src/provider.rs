use std::future::Future;

use crate::error::EmbedError;

/// Text used to discover a model's output dimension.
pub const PROBE_TEXT: &str = "probe";

pub trait Embedder: Send + Sync {
    /// Map `text` to a fixed-length vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or answers with no vector.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbedError>> + Send;

    fn name(&self) -> &str;

    /// Embed a probe string and report the vector length.
    ///
    /// # Errors
    ///
    /// Returns an error if the probe embedding fails.
    fn probe_dimension(&self) -> impl Future<Output = Result<u64, EmbedError>> + Send {
        async move {
            let probe = self.embed(PROBE_TEXT).await?;
            if probe.is_empty() {
                return Err(EmbedError::Other(format!(
                    "{} returned an empty probe vector",
                    self.name()
                )));
            }
            u64::try_from(probe.len()).map_err(|e| EmbedError::Other(e.to_string()))
        }
    }
}
