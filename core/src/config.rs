//! TOML Configuration File Support
//!
//! Centralized configuration loading for ollama-vision, supporting a
//! TOML file at `~/.config/ollama-vision/config.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! host = "localhost"
//! port = 11434
//! connect_timeout_ms = 1000
//! request_timeout_secs = 120
//!
//! [output]
//! file = "content_out@ollama.md"
//!
//! [vision]
//! prompt = "Extract text from this image:"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sink::DEFAULT_OUTPUT_FILE;

/// Default prompt sent with a vision request
pub const DEFAULT_VISION_PROMPT: &str = "Extract text from this image:";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Connection settings for the Ollama daemon
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendSettings {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Timeout for the startup TCP probe, in milliseconds
    pub connect_timeout_ms: u64,
    /// Timeout for a whole chat request, in seconds
    pub request_timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 11434,
            connect_timeout_ms: 1000,
            request_timeout_secs: 120,
        }
    }
}

impl BackendSettings {
    /// Overlay `OLLAMA_HOST` and `OLLAMA_PORT` onto these settings
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            if !host.trim().is_empty() {
                self.host = host;
            }
        }
        if let Some(port) = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.port = port;
        }
    }
}

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct BackendToml {
    host: Option<String>,
    port: Option<u16>,
    connect_timeout_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
}

/// Output section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct OutputToml {
    file: Option<PathBuf>,
}

/// Vision section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct VisionToml {
    prompt: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct AppToml {
    backend: BackendToml,
    output: OutputToml,
    vision: VisionToml,
}

/// Resolved application configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Ollama connection settings
    pub backend: BackendSettings,
    /// File the latest successful response is written to
    pub output_file: PathBuf,
    /// Prompt used for vision requests
    pub vision_prompt: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            vision_prompt: DEFAULT_VISION_PROMPT.to_string(),
        }
    }
}

impl AppConfig {
    /// The XDG path of the config file, if a config directory exists
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ollama-vision").join("config.toml"))
    }

    /// Load configuration: defaults, then the config file (if present),
    /// then environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.backend.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific TOML file, then apply defaults
    /// for anything the file leaves out
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: AppToml = toml::from_str(raw)?;
        let defaults = Self::default();

        Ok(Self {
            backend: BackendSettings {
                host: parsed.backend.host.unwrap_or(defaults.backend.host),
                port: parsed.backend.port.unwrap_or(defaults.backend.port),
                connect_timeout_ms: parsed
                    .backend
                    .connect_timeout_ms
                    .unwrap_or(defaults.backend.connect_timeout_ms),
                request_timeout_secs: parsed
                    .backend
                    .request_timeout_secs
                    .unwrap_or(defaults.backend.request_timeout_secs),
            },
            output_file: parsed.output.file.unwrap_or(defaults.output_file),
            vision_prompt: parsed.vision.prompt.unwrap_or(defaults.vision_prompt),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.backend.host, "localhost");
        assert_eq!(config.backend.port, 11434);
        assert_eq!(config.output_file, PathBuf::from("content_out@ollama.md"));
        assert_eq!(config.vision_prompt, DEFAULT_VISION_PROMPT);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [backend]
            port = 12345
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.host, "localhost");
        assert_eq!(config.backend.port, 12345);
        assert_eq!(config.vision_prompt, DEFAULT_VISION_PROMPT);
    }

    #[test]
    fn test_full_file() {
        let config = AppConfig::from_toml_str(
            r#"
            [backend]
            host = "10.0.0.2"
            port = 11500
            connect_timeout_ms = 250
            request_timeout_secs = 30

            [output]
            file = "/tmp/reply.md"

            [vision]
            prompt = "Describe this image."
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.host, "10.0.0.2");
        assert_eq!(config.backend.port, 11500);
        assert_eq!(config.backend.connect_timeout_ms, 250);
        assert_eq!(config.backend.request_timeout_secs, 30);
        assert_eq!(config.output_file, PathBuf::from("/tmp/reply.md"));
        assert_eq!(config.vision_prompt, "Describe this image.");
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(matches!(
            AppConfig::from_toml_str("backend = 7"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let missing = std::path::Path::new("/nonexistent/config.toml");
        assert!(matches!(
            AppConfig::from_file(missing),
            Err(ConfigError::ReadError { .. })
        ));
    }
}
