//! Client configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Environment variable naming the authority server URL.
pub const SERVER_URL_VAR: &str = "CHESSROOM_SERVER_URL";

fn default_server_url() -> String {
    "http://localhost:8080/api".to_string()
}

/// Configuration for the game client.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the authority server, including any path prefix.
    #[serde(default = "default_server_url")]
    server_url: String,
}

impl ClientConfig {
    /// Creates a configuration pointing at `server_url`.
    #[instrument(skip_all, fields(server_url = %server_url.as_ref()))]
    pub fn new(server_url: impl AsRef<str>) -> Self {
        Self {
            server_url: server_url.as_ref().to_string(),
        }
    }

    /// Builds configuration from the environment, falling back to the
    /// default local server.
    #[instrument]
    pub fn from_env() -> Self {
        let server_url = std::env::var(SERVER_URL_VAR).unwrap_or_else(|_| {
            debug!(var = SERVER_URL_VAR, "Variable unset; using default");
            default_server_url()
        });
        info!(%server_url, "Loaded configuration from environment");
        Self { server_url }
    }

    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        info!(server_url = %config.server_url, "Config loaded successfully");
        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
        }
    }
}

/// Configuration error with caller location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where the error occurred.
    pub line: u32,
    /// Source file where the error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
