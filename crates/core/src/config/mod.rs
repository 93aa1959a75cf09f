//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::worker::WorkerSettings;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin the app shell is served from.
    ///
    /// Set via SHELLCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix shared by the versioned and runtime cache names.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Release label embedded in the current cache name.
    ///
    /// Must change whenever the manifest changes, so installs roll over to a
    /// fresh generation. Also served as the version-check fallback.
    #[serde(default = "default_release")]
    pub release: String,

    /// App shell URLs stored at install.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Substring identifying the version-check resource.
    #[serde(default = "default_version_marker")]
    pub version_marker: String,

    /// Path of the worker script itself.
    #[serde(default = "default_worker_script")]
    pub worker_script: String,

    /// Document served for offline navigations.
    #[serde(default = "default_offline_document")]
    pub offline_document: String,

    /// Whether a freshly installed worker activates without waiting.
    #[serde(default = "default_true")]
    pub skip_waiting: bool,

    /// Maximum concurrent asset fetches during install.
    #[serde(default = "default_install_concurrency")]
    pub install_concurrency: usize,

    /// Path to SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_cache_prefix() -> String {
    "5am-club".into()
}

fn default_release() -> String {
    "6.1.1".into()
}

fn default_manifest() -> Vec<String> {
    [
        "/",
        "/index.html",
        "https://cdn.tailwindcss.com",
        "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&display=swap",
        "https://unpkg.com/lucide@latest",
        "https://cdn.jsdelivr.net/npm/chart.js",
        "https://cdnjs.cloudflare.com/ajax/libs/Sortable/1.15.0/Sortable.min.js",
        "https://cdn.jsdelivr.net/npm/marked/marked.min.js",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_version_marker() -> String {
    "version.json".into()
}

fn default_worker_script() -> String {
    "/sw.js".into()
}

fn default_offline_document() -> String {
    "/index.html".into()
}

fn default_install_concurrency() -> usize {
    4
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            release: default_release(),
            manifest: default_manifest(),
            version_marker: default_version_marker(),
            worker_script: default_worker_script(),
            offline_document: default_offline_document(),
            skip_waiting: true,
            install_concurrency: default_install_concurrency(),
            db_path: default_db_path(),
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

    /// Versioned name of the current generation's cache.
    pub fn current_cache_name(&self) -> String {
        format!("{}-v{}", self.cache_prefix, self.release)
    }

    pub fn runtime_cache_name(&self) -> String {
        format!("{}-runtime", self.cache_prefix)
    }

    /// Parsed origin URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not an http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid { field: "origin".into(), reason: format!("unsupported scheme: {scheme}") }),
        }
    }

    /// Derive the explicit settings a worker generation is built from.
    pub fn worker_settings(&self) -> Result<WorkerSettings, ConfigError> {
        let mut settings = WorkerSettings::new(
            self.current_cache_name(),
            self.runtime_cache_name(),
            self.manifest.clone(),
            self.origin_url()?,
        );
        settings.version_marker = self.version_marker.clone();
        settings.worker_script = self.worker_script.clone();
        settings.offline_document = self.offline_document.clone();
        settings.fallback_version = self.release.clone();
        settings.install_concurrency = self.install_concurrency;
        settings.skip_waiting_on_install = self.skip_waiting;
        Ok(settings)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
