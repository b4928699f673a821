//! Configuration system for the chat backend
//!
//! Configuration is read from a TOML file. Every section and field has a
//! default, so an empty file (or no file at all) yields a runnable service.
//! `HOST` and `PORT` environment variables override the server section.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub classifier: ClassifierSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
}

/// Project metadata reported by the API and health endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSection {
    #[serde(default = "default_project_name")]
    pub name: String,
    #[serde(default = "default_project_version")]
    pub version: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            version: default_project_version(),
        }
    }
}

fn default_project_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_project_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// HTTP server section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path prefix for the chat API, without leading or trailing slashes
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Per-request timeout applied around pipeline execution
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_prefix: default_api_prefix(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_api_prefix() -> String {
    "api/v1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Keyword sets used by the classifier, checked in declaration order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierSection {
    #[serde(default = "default_data_keywords")]
    pub data_keywords: Vec<String>,
    #[serde(default = "default_analysis_keywords")]
    pub analysis_keywords: Vec<String>,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            data_keywords: default_data_keywords(),
            analysis_keywords: default_analysis_keywords(),
        }
    }
}

fn default_data_keywords() -> Vec<String> {
    vec!["data".to_string(), "fetch".to_string()]
}

fn default_analysis_keywords() -> Vec<String> {
    vec!["analyze".to_string(), "summary".to_string()]
}

/// Pipeline behaviour options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSection {
    /// Append a routing annotation and echo the user message before composing
    #[serde(default)]
    pub normalize_state: bool,
    /// Upper bound on the triggering message length, in characters
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            normalize_state: false,
            max_message_chars: default_max_message_chars(),
        }
    }
}

fn default_max_message_chars() -> usize {
    8000
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid value for environment variable {name}: {value}")]
    InvalidEnvVar { name: String, value: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppConfig {
    /// Load configuration from a TOML file, apply env overrides and validate
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text, apply env overrides and validate
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = toml::from_str(content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration with env overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: "PORT".to_string(),
                value: port.clone(),
            })?;
        }
        Ok(())
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "server.host must not be empty".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must be greater than zero".to_string(),
            ));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        validate_keywords("classifier.data_keywords", &self.classifier.data_keywords)?;
        validate_keywords(
            "classifier.analysis_keywords",
            &self.classifier.analysis_keywords,
        )?;
        if self.pipeline.max_message_chars == 0 {
            return Err(ConfigError::InvalidConfig(
                "pipeline.max_message_chars must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Chat API prefix with surrounding slashes removed
    pub fn api_prefix(&self) -> &str {
        self.server.api_prefix.trim_matches('/')
    }
}

fn validate_keywords(field: &str, keywords: &[String]) -> Result<(), ConfigError> {
    if keywords.is_empty() {
        return Err(ConfigError::InvalidConfig(format!(
            "{field} must contain at least one keyword"
        )));
    }
    if keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::InvalidConfig(format!(
            "{field} must not contain blank keywords"
        )));
    }
    Ok(())
}
