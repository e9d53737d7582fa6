//! Vector store abstraction: a dyn-compatible trait, the Qdrant backend, and an
//! in-memory double for tests.

#[cfg(any(test, feature = "mock"))]
pub mod in_memory_store;
pub mod qdrant_ops;
pub mod vector_store;

#[cfg(any(test, feature = "mock"))]
pub use in_memory_store::InMemoryVectorStore;
pub use qdrant_ops::QdrantOps;
pub use vector_store::{Payload, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};
