//! Configuration for personadocs.
//!
//! Provides the [`PersonaDocsConfig`] struct holding the Azure OpenAI connection details,
//! sampling parameters and the orchestration round budget. Construct it manually, or
//! load it from the environment (and an optional `.env` file) with
//! [`PersonaDocsConfig::from_env`].
//!
//! # Example
//!
//! ```rust
//! use personadocs::PersonaDocsConfig;
//!
//! let config = PersonaDocsConfig {
//!     endpoint: "https://my-resource.openai.azure.com".into(),
//!     api_key: "secret".into(),
//!     model: "gpt-4o".into(),
//!     ..PersonaDocsConfig::default()
//! };
//! assert_eq!(config.max_rounds, 4);
//! ```

use std::error::Error;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the model / deployment name.
pub const ENV_MODEL: &str = "model";
/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "api_key";
/// Environment variable holding the Azure resource endpoint.
pub const ENV_ENDPOINT: &str = "azure_url";
/// Environment variable holding the Azure API version.
pub const ENV_API_VERSION: &str = "api_ver";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    MissingVar(&'static str),
    /// The `.env` file exists but could not be read.
    EnvFile(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVar(name) => {
                write!(f, "Missing required environment variable: {}", name)
            }
            ConfigError::EnvFile(msg) => write!(f, "Could not load env file: {}", msg),
        }
    }
}

impl Error for ConfigError {}

/// Global configuration for a personadocs run.
///
/// Users construct it however they want; only [`PersonaDocsConfig::from_env`] touches
/// the process environment.
#[derive(Debug, Clone)]
pub struct PersonaDocsConfig {
    /// Azure resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_key: String,
    /// Deployment (model) name.
    pub model: String,
    /// Azure REST API version sent as the `api-version` query parameter.
    pub api_version: String,
    pub temperature: f32,
    /// Sampling seed forwarded to the service for more repeatable output.
    pub seed: Option<u64>,
    /// Orchestration round budget; must be at least the number of personas.
    pub max_rounds: usize,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for PersonaDocsConfig {
    /// Sampling defaults match the ones the personas were tuned with: temperature 0.1,
    /// seed 100, and one spare round over the three personas.
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            model: String::new(),
            api_version: "2024-06-01".to_string(),
            temperature: 0.1,
            seed: Some(100),
            max_rounds: 4,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl PersonaDocsConfig {
    /// Load `.env` from the current directory when present, then read the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::EnvFile(e.to_string())),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the given env file into the process environment, then read it.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref()).map_err(|e| ConfigError::EnvFile(e.to_string()))?;
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source. `api_ver` falls back to the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let defaults = Self::default();
        Ok(Self {
            endpoint: required(ENV_ENDPOINT)?,
            api_key: required(ENV_API_KEY)?,
            model: required(ENV_MODEL)?,
            api_version: lookup(ENV_API_VERSION)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.api_version),
            ..defaults
        })
    }
}
