//! HTTP API over the gdrag indexing and retrieval pipeline.

mod error;
mod handlers;
mod router;
mod server;

pub use error::{ApiError, GatewayError};
pub use server::GatewayServer;
