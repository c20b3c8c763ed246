//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLKEEP_*)
//! 2. TOML config file (if SHELLKEEP_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLKEEP_*)
/// 2. TOML config file (if SHELLKEEP_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite store database.
    ///
    /// Set via SHELLKEEP_STORE_PATH environment variable.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Origin the app-shell paths resolve against, e.g. "https://app.example.com".
    ///
    /// Set via SHELLKEEP_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Opaque version tag for the current store generation.
    ///
    /// Set via SHELLKEEP_CACHE_VERSION environment variable. Bumping this
    /// tag is what triggers a new install/activate cycle.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// App-shell paths that must all be stored before install succeeds.
    ///
    /// Set via SHELLKEEP_SHELL_MANIFEST environment variable.
    #[serde(default = "default_shell_manifest")]
    pub shell_manifest: Vec<String>,

    /// Hosts whose requests are always forwarded live and never stored.
    ///
    /// Set via SHELLKEEP_BYPASS_HOSTS environment variable.
    #[serde(default = "default_bypass_hosts")]
    pub bypass_hosts: Vec<String>,

    /// Promote a freshly installed version immediately instead of waiting
    /// for clients of the old version to close.
    ///
    /// Set via SHELLKEEP_SKIP_WAITING environment variable.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHELLKEEP_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHELLKEEP_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects to follow.
    ///
    /// Set via SHELLKEEP_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./shellkeep-store.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_shell_manifest() -> Vec<String> {
    vec!["/".into(), "/index.html".into(), "/manifest.json".into()]
}

fn default_bypass_hosts() -> Vec<String> {
    vec!["generativelanguage.googleapis.com".into()]
}

fn default_user_agent() -> String {
    "shellkeep/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            origin: default_origin(),
            cache_version: default_cache_version(),
            shell_manifest: default_shell_manifest(),
            bypass_hosts: default_bypass_hosts(),
            skip_waiting: true,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLKEEP_`
    /// 2. TOML file from `SHELLKEEP_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLKEEP_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLKEEP_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
