#[cfg(feature = "mock")]
use crate::mock::MockEmbedder;
use crate::ollama::OllamaEmbedder;
use crate::openai::OpenAiEmbedder;

use crate::error::EmbedError;
use crate::provider::Embedder;

macro_rules! delegate_embedder {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyEmbedder::Ollama($p) => $expr,
            AnyEmbedder::OpenAi($p) => $expr,
            #[cfg(feature = "mock")]
            AnyEmbedder::Mock($p) => $expr,
        }
    };
}

/// Closed set of embedding backends selectable from configuration.
#[derive(Debug, Clone)]
pub enum AnyEmbedder {
    Ollama(OllamaEmbedder),
    OpenAi(OpenAiEmbedder),
    #[cfg(feature = "mock")]
    Mock(MockEmbedder),
}

impl Embedder for AnyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        delegate_embedder!(self, |p| p.embed(text).await)
    }

    fn name(&self) -> &str {
        delegate_embedder!(self, |p| p.name())
    }
}
