//! Per-generation controller configuration.

use std::time::Duration;

use url::Url;
use wird_core::config::{DEFAULT_EXCLUDE, DEFAULT_PRECACHE, DEFAULT_STATIC_MARKERS};
use wird_core::{AppConfig, Error, PrecacheMode};

/// Everything a controller generation needs, passed in at construction.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Origin the scope covers; manifest paths and the shell document resolve against it.
    pub origin: Url,
    pub static_version: String,
    pub dynamic_version: String,
    /// Shell URLs pre-cached at install.
    pub precache: Vec<String>,
    pub precache_mode: PrecacheMode,
    /// URL substrings never intercepted.
    pub exclude: Vec<String>,
    /// URL substrings that make a request static-class.
    pub static_markers: Vec<String>,
    pub skip_waiting_on_install: bool,
    /// Upper bound on a single network attempt.
    pub fetch_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            origin: Url::parse("http://localhost:3000").expect("static origin is valid"),
            static_version: "v2".into(),
            dynamic_version: "v2".into(),
            precache: DEFAULT_PRECACHE.iter().map(|s| s.to_string()).collect(),
            precache_mode: PrecacheMode::BestEffort,
            exclude: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
            static_markers: DEFAULT_STATIC_MARKERS.iter().map(|s| s.to_string()).collect(),
            skip_waiting_on_install: false,
            fetch_timeout: Duration::from_secs(20),
        }
    }
}

impl ControllerConfig {
    /// Build from the loaded application configuration.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;

        Ok(Self {
            origin,
            static_version: config.static_version.clone(),
            dynamic_version: config.dynamic_version.clone(),
            precache: config.precache.clone(),
            precache_mode: config.precache_mode,
            exclude: config.exclude.clone(),
            static_markers: config.static_markers.clone(),
            skip_waiting_on_install: config.skip_waiting_on_install,
            fetch_timeout: config.timeout(),
        })
    }

    /// A copy with new version tags, as a release would ship.
    pub fn with_versions(&self, static_version: Option<&str>, dynamic_version: Option<&str>) -> Self {
        let mut next = self.clone();
        if let Some(v) = static_version {
            next.static_version = v.to_string();
        }
        if let Some(v) = dynamic_version {
            next.dynamic_version = v.to_string();
        }
        next
    }

    pub fn static_partition(&self) -> String {
        format!("static-{}", self.static_version)
    }

    pub fn dynamic_partition(&self) -> String {
        format!("dynamic-{}", self.dynamic_version)
    }

    /// URL of the shell document served to offline navigations.
    pub fn root_url(&self) -> Url {
        let mut root = self.origin.clone();
        root.set_path("/");
        root.set_query(None);
        root.set_fragment(None);
        root
    }
}
