//! Configuration loading and service bootstrap shared by the CLI and the
//! HTTP gateway.

pub mod bootstrap;
pub mod config;

pub use bootstrap::App;
pub use config::{Config, resolve_config_path};
