//! Embedding provider abstraction with Ollama and OpenAI-compatible backends.

pub mod any;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;

pub use any::AnyEmbedder;
pub use error::EmbedError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use provider::{Embedder, PROBE_TEXT};
