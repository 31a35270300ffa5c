use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::KeeperError;

/// Top-level application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Generative model settings
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Document store settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Web server settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Settings for the Gemini extraction backend
#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    /// API key (can also be set via the GEMINI_API_KEY environment variable)
    pub api_key: Option<String>,
    /// Model used for URL-sourced extraction
    #[serde(default = "default_url_model")]
    pub url_model: String,
    /// Model used for image-sourced extraction
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Sampling temperature; extraction wants determinism, so keep it low
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            url_model: default_url_model(),
            image_model: default_image_model(),
            temperature: default_temperature(),
        }
    }
}

/// Settings for the SurrealDB connection
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Connection string, e.g. "ws://localhost:8000" or "memory"
    /// (can also be set via the SURREALDB_ENDPOINT environment variable)
    pub endpoint: Option<String>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_database")]
    pub database: String,
    /// Root credentials for remote endpoints
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            namespace: default_namespace(),
            database: default_database(),
            username: None,
            password: None,
        }
    }
}

/// Settings for the HTTP listener
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

// Default value functions
fn default_url_model() -> String {
    "gemini-1.5-pro-latest".to_string()
}

fn default_image_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_namespace() -> String {
    "keeper".to_string()
}

fn default_database() -> String {
    "recipes".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with KEEPER__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: KEEPER__GEMINI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Optional config file (can be missing)
            .add_source(File::with_name("config").required(false))
            // Use double underscore for nested: KEEPER__DATABASE__ENDPOINT
            .add_source(
                Environment::with_prefix("KEEPER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

impl GeminiConfig {
    /// Resolve the API key from config or environment; absence is fatal
    pub fn api_key(&self) -> Result<String, KeeperError> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or(KeeperError::MissingConfig("GEMINI_API_KEY"))
    }
}

impl DatabaseConfig {
    /// Resolve the store endpoint from config or environment; absence is fatal
    pub fn endpoint(&self) -> Result<String, KeeperError> {
        self.endpoint
            .clone()
            .or_else(|| std::env::var("SURREALDB_ENDPOINT").ok())
            .ok_or(KeeperError::MissingConfig("SURREALDB_ENDPOINT"))
    }
}
