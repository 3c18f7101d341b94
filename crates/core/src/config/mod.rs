//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WIRD_*)
//! 2. TOML config file (if WIRD_CONFIG_FILE set)
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

/// Shell URLs pre-cached into the static partition at install.
pub const DEFAULT_PRECACHE: &[&str] = &[
    "/",
    "/search",
    "/share",
    "/manage",
    "/settings",
    "/quran-icon.png",
    "/manifest.json",
    "/_next/static/css/app/layout.css",
    "/_next/static/chunks/webpack.js",
    "/_next/static/chunks/main.js",
];

/// URL substrings that are never intercepted or cached.
pub const DEFAULT_EXCLUDE: &[&str] =
    &["/api/", "chrome-extension://", "moz-extension://", "safari-extension://", ".hot-update."];

/// URL substrings that mark a request as a static shell asset.
pub const DEFAULT_STATIC_MARKERS: &[&str] = &["/_next/static/", "/quran-icon.png", "/manifest.json"];

/// How install treats a failing pre-cache URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecacheMode {
    /// Each URL is fetched and stored on its own; failures are logged and skipped.
    #[default]
    BestEffort,
    /// One failing URL fails the whole install and nothing is stored.
    Atomic,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WIRD_*)
/// 2. TOML config file (if WIRD_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via WIRD_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the controller's scope covers; relative URLs resolve against it.
    ///
    /// Set via WIRD_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Version tag of the static partition (`static-<tag>`).
    ///
    /// Set via WIRD_STATIC_VERSION environment variable.
    #[serde(default = "default_version")]
    pub static_version: String,

    /// Version tag of the dynamic partition (`dynamic-<tag>`).
    ///
    /// Set via WIRD_DYNAMIC_VERSION environment variable.
    #[serde(default = "default_version")]
    pub dynamic_version: String,

    /// Shell URLs pre-cached at install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// URL substrings that bypass the controller entirely.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// URL substrings that make a request static-class.
    #[serde(default = "default_static_markers")]
    pub static_markers: Vec<String>,

    /// Pre-cache failure handling.
    ///
    /// Set via WIRD_PRECACHE_MODE environment variable (`best_effort` or `atomic`).
    #[serde(default)]
    pub precache_mode: PrecacheMode,

    /// Activate a freshly installed controller without waiting for SKIP_WAITING.
    ///
    /// Set via WIRD_SKIP_WAITING_ON_INSTALL environment variable.
    #[serde(default)]
    pub skip_waiting_on_install: bool,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via WIRD_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via WIRD_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Network attempt timeout in milliseconds.
    ///
    /// Set via WIRD_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./wird-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_version() -> String {
    "v2".into()
}

fn default_precache() -> Vec<String> {
    DEFAULT_PRECACHE.iter().map(|s| s.to_string()).collect()
}

fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect()
}

fn default_static_markers() -> Vec<String> {
    DEFAULT_STATIC_MARKERS.iter().map(|s| s.to_string()).collect()
}

fn default_user_agent() -> String {
    "wird-offline/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            static_version: default_version(),
            dynamic_version: default_version(),
            precache: default_precache(),
            exclude: default_exclude(),
            static_markers: default_static_markers(),
            precache_mode: PrecacheMode::default(),
            skip_waiting_on_install: false,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
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
    /// 1. Environment variables prefixed with `WIRD_`
    /// 2. TOML file from `WIRD_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("WIRD_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WIRD_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./wird-cache.sqlite"));
        assert_eq!(config.origin, "http://localhost:3000");
        assert_eq!(config.user_agent, "wird-offline/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.precache.len(), 10);
        assert_eq!(config.precache[0], "/");
        assert!(config.exclude.iter().any(|e| e == "/api/"));
        assert_eq!(config.precache_mode, PrecacheMode::BestEffort);
        assert!(!config.skip_waiting_on_install);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_precache_mode_from_toml() {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string("precache_mode = \"atomic\"\nstatic_version = \"v9\""))
            .extract()
            .unwrap();
        assert_eq!(config.precache_mode, PrecacheMode::Atomic);
        assert_eq!(config.static_version, "v9");
    }
}
