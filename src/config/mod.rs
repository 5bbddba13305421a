//! Configuration management
//!
//! This module handles loading and parsing configuration for the coursedesk client.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Object storage configuration (cover images)
    #[serde(default)]
    pub storage: StorageConfig,
    /// Request cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Session persistence configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    20
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket the presigned upload URL is issued for
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Public URL prefix cover image names are appended to
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    /// Maximum cover image size in bytes (default: 2MB)
    #[serde(default = "default_max_image_size")]
    pub max_image_size: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            image_base_url: default_image_base_url(),
            max_image_size: default_max_image_size(),
        }
    }
}

fn default_bucket() -> String {
    "vpc-public".to_string()
}

fn default_image_base_url() -> String {
    "https://vpc-public.s3.ap-south-1.amazonaws.com/course/cover-image/".to_string()
}

/// Upper bound for `storage.max_image_size`; config may only lower it
pub const MAX_IMAGE_SIZE: u64 = 2 * 1024 * 1024;

fn default_max_image_size() -> u64 {
    MAX_IMAGE_SIZE
}

impl StorageConfig {
    /// Check if a MIME type is an image type
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        mime_type.starts_with("image/")
    }

    /// File extension derived from the MIME subtype (`image/png` -> `png`)
    pub fn get_extension<'a>(&self, mime_type: &'a str) -> &'a str {
        mime_type.split('/').nth(1).filter(|ext| !ext.is_empty()).unwrap_or("bin")
    }
}

/// Request cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached query results
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_capacity: default_max_capacity(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_max_capacity() -> u64 {
    1000
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory the session token file lives in
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Token file name inside `data_dir`
    #[serde(default = "default_token_file")]
    pub token_file: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            token_file: default_token_file(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("coursedesk"))
        .unwrap_or_else(|| PathBuf::from(".coursedesk"))
}

fn default_token_file() -> String {
    "session.json".to_string()
}

impl SessionConfig {
    /// Full path of the persisted token file
    pub fn token_path(&self) -> PathBuf {
        self.data_dir.join(&self.token_file)
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - COURSEDESK_API_BASE_URL
    /// - COURSEDESK_API_TIMEOUT_SECONDS
    /// - COURSEDESK_STORAGE_BUCKET
    /// - COURSEDESK_STORAGE_IMAGE_BASE_URL
    /// - COURSEDESK_CACHE_TTL_SECONDS
    /// - COURSEDESK_SESSION_DATA_DIR
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            )));
        }
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_seconds must be greater than zero".to_string(),
            ));
        }
        if self.storage.max_image_size == 0 || self.storage.max_image_size > MAX_IMAGE_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "storage.max_image_size must be between 1 and {} bytes, got {}",
                MAX_IMAGE_SIZE, self.storage.max_image_size
            )));
        }
        if self.cache.ttl_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "cache.ttl_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("COURSEDESK_API_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("COURSEDESK_API_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.api.timeout_seconds = timeout;
            }
        }

        if let Ok(bucket) = std::env::var("COURSEDESK_STORAGE_BUCKET") {
            self.storage.bucket = bucket;
        }
        if let Ok(url) = std::env::var("COURSEDESK_STORAGE_IMAGE_BASE_URL") {
            self.storage.image_base_url = url;
        }

        if let Ok(ttl) = std::env::var("COURSEDESK_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        if let Ok(dir) = std::env::var("COURSEDESK_SESSION_DATA_DIR") {
            self.session.data_dir = PathBuf::from(dir);
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
