/// Configuration management for the favorites service
///
/// Handles server binding, substrate location and the favorites namespace.

use crate::store::FlushMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Local storage configuration
    pub storage: StorageConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Substrate configuration for the favorites store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the preference database (default: "data")
    pub data_dir: String,
    /// SQLite file name inside `data_dir` (default: "preferences.db")
    pub db_file: String,
    /// Namespace holding favorite workflows (default: "favorite_workflows")
    pub favorites_namespace: String,
    /// Flush mode for deferred-capable writes (delete, save)
    pub flush: FlushMode,
}

impl StorageConfig {
    /// Full path of the SQLite preference database
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.db_file)
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR overrides for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("WF_FAVORITES_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("WF_FAVORITES_PORT")
                    .unwrap_or_else(|_| "3004".to_string())
                    .parse()
                    .unwrap_or(3004),
            },
            storage: StorageConfig {
                data_dir: std::env::var("WF_FAVORITES_DATA_DIR")
                    .unwrap_or_else(|_| "data".to_string()),
                db_file: std::env::var("WF_FAVORITES_DB_FILE")
                    .unwrap_or_else(|_| "preferences.db".to_string()),
                favorites_namespace: std::env::var("WF_FAVORITES_NAMESPACE")
                    .unwrap_or_else(|_| crate::sync::FAVORITES_NAMESPACE.to_string()),
                flush: std::env::var("WF_FAVORITES_FLUSH")
                    .ok()
                    .and_then(|mode| mode.parse().ok())
                    .unwrap_or_default(),
            },
        }
    }
}
