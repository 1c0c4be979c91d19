//! Configuration management for the Clinic client.
//!
//! The client reads a single configuration file at `~/.clinic/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Explicit config file values
//! 2. Environment variables (CLINIC_* prefix)
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `CLINIC_CHAT_URL` → chat.url
//! - `CLINIC_API_URL` → api.base_url
//! - `CLINIC_LOG_LEVEL` → observability.log_level
//! - `CLINIC_LOG_FORMAT` → observability.log_format

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{Result, ResultExt};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".clinic"),
        |dirs| dirs.home_dir().join(".clinic"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Chat Endpoint Configuration
// ============================================================================

/// Assistant chat endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// WebSocket URL of the assistant endpoint.
    #[serde(default = "default_chat_url")]
    pub url: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            url: default_chat_url(),
        }
    }
}

fn default_chat_url() -> String {
    "ws://localhost:8000/ws".into()
}

// ============================================================================
// Collaborator API Configuration
// ============================================================================

/// Collaborator REST API configuration (login, appointments).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the collaborator API.
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_api_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:5000/api".into()
}

fn default_api_timeout_secs() -> u64 {
    30
}

// ============================================================================
// Reconnect Policy Configuration
// ============================================================================

/// Reconnect policy for the supervised chat link.
///
/// The bare link never retries on its own; these values drive the
/// supervising layer only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Maximum consecutive reconnect attempts before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff before the first retry, in seconds.
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,

    /// Upper bound for the doubling backoff, in seconds.
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Timeout applied to each connection attempt, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_secs() -> u64 {
    1
}

fn default_max_backoff_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration for the Clinic client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Assistant chat endpoint.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Collaborator API endpoints.
    #[serde(default)]
    pub api: ApiConfig,

    /// Reconnect policy for the supervised link.
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .context(format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .context(format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .context(format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable fallbacks.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CLINIC_CHAT_URL") {
            self.chat.url = url;
        }
        if let Ok(url) = std::env::var("CLINIC_API_URL") {
            self.api.base_url = url;
        }
        if let Ok(level) = std::env::var("CLINIC_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("CLINIC_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chat.url, "ws://localhost:8000/ws");
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.reconnect.max_retries, 3);
        assert_eq!(config.reconnect.initial_backoff_secs, 1);
        assert_eq!(config.reconnect.max_backoff_secs, 30);
        assert_eq!(config.reconnect.connect_timeout_secs, 10);
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "chat": { "url": "ws://assistant.example:8000/ws" } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.chat.url, "ws://assistant.example:8000/ws");
        // Untouched sections keep their defaults
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.reconnect.max_retries, 3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "reconnect": {{ "max_retries": 5, "initial_backoff_secs": 2 }} }}"#
        )
        .unwrap();

        let config = Config::load_from(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.reconnect.max_retries, 5);
        assert_eq!(config.reconnect.initial_backoff_secs, 2);
        assert_eq!(config.reconnect.max_backoff_secs, 30);
    }

    #[test]
    fn test_load_from_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = Config::load_from(&file.path().to_path_buf()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("CLINIC_CHAT_URL", "ws://override:9000/ws");
        std::env::set_var("CLINIC_LOG_LEVEL", "debug");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.chat.url, "ws://override:9000/ws");
        assert_eq!(config.observability.log_level, "debug");

        std::env::remove_var("CLINIC_CHAT_URL");
        std::env::remove_var("CLINIC_LOG_LEVEL");
    }
}
