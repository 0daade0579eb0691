use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use timbre_core::DEFAULT_TOP_K;

/// Default Web API base for the Spotify feature provider.
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";

/// Default token endpoint host for the client-credentials flow.
pub const DEFAULT_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";

/// Configuration for timbre.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (TIMBRE_* prefix)
/// 3. Config file (~/.config/timbre/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Feature provider credentials and connection settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Path to the raw catalog file.
    ///
    /// Can be set via:
    /// - CLI: --catalog /path/to/catalog.json
    /// - ENV: TIMBRE_CATALOG_PATH
    /// - Config: catalog_path = "/path/to/catalog.json"
    /// - Default: ~/.local/share/timbre/catalog.json
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Number of recommendations to return when -k is not given.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Logger settings handed to twyg.
    #[serde(default)]
    pub logging: twyg::Opts,
}

/// Connection settings for the feature provider.
///
/// Credentials live here and are handed to the provider client when it
/// is constructed; nothing is read from or written to the process
/// environment afterwards.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// OAuth client id.
    ///
    /// Can be set via:
    /// - ENV: TIMBRE_PROVIDER_CLIENT_ID
    /// - Config: [provider] client_id = "..."
    pub client_id: Option<String>,

    /// OAuth client secret.
    pub client_secret: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_accounts_base")]
    pub accounts_base: String,

    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Retries for transient failures (5xx, 429, timeouts).
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_base: default_api_base(),
            accounts_base: default_accounts_base(),
            requests_per_second: default_requests_per_second(),
            max_retries: default_max_retries(),
        }
    }
}

impl ProviderConfig {
    /// The client id and secret, if both are set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("api_base", &self.api_base)
            .field("accounts_base", &self.accounts_base)
            .field("requests_per_second", &self.requests_per_second)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            catalog_path: default_catalog_path(),
            top_k: default_top_k(),
            logging: twyg::Opts::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/timbre/config.toml
    /// Reads environment variables with TIMBRE_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new()
            .context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path.to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder.add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("timbre");
        builder.add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build()
            .context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with a custom catalog path.
    ///
    /// This is used when the --catalog CLI flag is provided.
    pub fn load_with_catalog_path(catalog_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.catalog_path = catalog_path;
        Ok(config)
    }
}

fn default_catalog_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timbre")
        .join("catalog.json")
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_accounts_base() -> String {
    DEFAULT_ACCOUNTS_BASE.to_string()
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_max_retries() -> usize {
    3
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/timbre/config.toml
/// - macOS: ~/Library/Application Support/timbre/config.toml
/// - Windows: %APPDATA%\timbre\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timbre")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Timbre Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (TIMBRE_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the raw catalog (JSON array of track rows)
#
# Can also be set via:
# - CLI: timbre recommend --catalog /custom/catalog.json ...
# - Environment: TIMBRE_CATALOG_PATH=/custom/catalog.json
#
# Default: Platform-specific data directory
#catalog_path = "/path/to/catalog.json"

# Number of recommendations when -k is not given
top_k = 40

[provider]
# Client credentials for the Spotify Web API, used by `timbre ingest`
#
# Register an application at: https://developer.spotify.com/dashboard
client_id = "your-client-id-here"
client_secret = "your-client-secret-here"

# Request pacing and retries for transient failures
#requests_per_second = 10
#max_retries = 3
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config())
        .context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.catalog_path.as_os_str().is_empty());
        assert_eq!(config.top_k, 40);
        assert!(config.provider.credentials().is_none());
        assert_eq!(config.provider.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_config_with_custom_catalog_path() {
        let custom_path = PathBuf::from("/tmp/catalog.json");
        let config = Config::load_with_catalog_path(custom_path.clone());
        assert!(config.is_ok());
        assert_eq!(config.unwrap().catalog_path, custom_path);
    }

    #[test]
    fn test_credentials_require_both_parts() {
        let mut provider = ProviderConfig {
            client_id: Some("id".to_string()),
            ..ProviderConfig::default()
        };
        assert!(provider.credentials().is_none());

        provider.client_secret = Some(String::new());
        assert!(provider.credentials().is_none());

        provider.client_secret = Some("secret".to_string());
        assert_eq!(provider.credentials(), Some(("id", "secret")));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let provider = ProviderConfig {
            client_id: Some("visible-id".to_string()),
            client_secret: Some("hunter2".to_string()),
            ..ProviderConfig::default()
        };
        let debug = format!("{:?}", provider);
        assert!(debug.contains("visible-id"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_example_config_mentions_provider_section() {
        assert!(example_config().contains("[provider]"));
        assert!(example_config().contains("client_secret"));
    }
}
