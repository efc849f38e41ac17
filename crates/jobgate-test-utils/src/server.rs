//! Server test helpers.
//!
//! Helpers for constructing a [`Server`] from a real TOML file in a
//! temporary directory.

use std::path::PathBuf;

use axum::Router;
use jobgate_config::AppConfig;
use jobgate_core::Server;
use tempfile::TempDir;

/// A test-scoped server with an owned temp directory for its config file.
///
/// The temp directory is deleted automatically when this value is dropped,
/// guaranteeing cleanup even on panic.
pub struct TestServer {
    pub server: Server,
    pub config_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestServer {
    /// Create a server from a temporary config file containing `toml_content`.
    pub async fn with_toml(toml_content: &str) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("jobgate.toml");
        tokio::fs::write(&config_path, toml_content)
            .await
            .expect("failed to write test config");

        let config = AppConfig::load(&config_path)
            .await
            .expect("failed to parse test config");
        let server = Server::new(config).expect("failed to build server");

        Self {
            server,
            config_path,
            _temp_dir: temp_dir,
        }
    }

    /// Create a server with default config.
    pub async fn default_config() -> Self {
        Self::with_toml("").await
    }

    /// The fully wired router, for `oneshot` requests.
    pub fn router(&self) -> Router {
        self.server
            .route_table()
            .expect("route registration")
            .into_router()
    }
}
