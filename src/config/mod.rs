//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `SCHOLAR_AGGREGATOR` (nested keys use
//! `__`, e.g. `SCHOLAR_AGGREGATOR__IEEE__API_KEY`).
//!
//! ```toml
//! [http]
//! timeout_secs = 30
//!
//! [pubmed]
//! email = "you@example.com"
//! tool = "scholar-aggregator"
//!
//! [ieee]
//! api_key = "your-ieee-api-key"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 5000
//! ```
//!
//! Credentials are read once at startup and handed to the source adapters;
//! nothing consults the environment after that.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "SCHOLAR_AGGREGATOR";

/// File name searched for in the working directory
pub const LOCAL_CONFIG_FILE: &str = "scholar-aggregator.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub pubmed: PubMedConfig,
    pub arxiv: ArxivConfig,
    pub ieee: IeeeConfig,
    pub server: ServerConfig,
}

/// Outbound HTTP settings shared by all sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,

    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// NCBI E-utilities settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PubMedConfig {
    /// E-utilities root, without the trailing `esearch.fcgi`
    pub base_url: String,

    /// Registered contact address sent with every request
    pub email: Option<String>,

    /// Tool name registered with NCBI
    pub tool: Option<String>,

    /// Optional NCBI API key (raises the rate limit)
    pub api_key: Option<String>,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            email: non_empty_env("NCBI_EMAIL"),
            tool: Some(env!("CARGO_PKG_NAME").to_string()),
            api_key: non_empty_env("NCBI_API_KEY"),
        }
    }
}

/// arXiv API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArxivConfig {
    pub base_url: String,
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            base_url: "http://export.arxiv.org/api/query".to_string(),
        }
    }
}

/// IEEE Xplore API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IeeeConfig {
    pub base_url: String,

    /// API key from https://developer.ieee.org/
    pub api_key: Option<String>,
}

impl Default for IeeeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ieeexploreapi.ieee.org/api/v1/search/articles".to_string(),
            api_key: non_empty_env("IEEE_XPLORE_API_KEY"),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl AppConfig {
    /// Copy of this configuration with credentials masked, for display
    pub fn redacted(&self) -> Self {
        let mask = |value: &Option<String>| value.as_ref().map(|_| "********".to_string());
        let mut config = self.clone();
        config.pubmed.api_key = mask(&self.pubmed.api_key);
        config.ieee.api_key = mask(&self.ieee.api_key);
        config
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Load configuration from an optional file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Find a configuration file in the default locations
///
/// Checks `./scholar-aggregator.toml`, then
/// `<config dir>/scholar-aggregator/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
        .filter(|path| path.is_file())
}
