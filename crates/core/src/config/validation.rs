//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL
    /// - `cache_prefix`, `version_marker` or `user_agent` is empty
    /// - `worker_script` or `offline_document` is not an absolute path
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `install_concurrency` is 0 or exceeds 32
    /// - a manifest entry is blank
    ///
    /// Returns `ConfigError::Missing` if `release` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.origin_url()?;

        if self.cache_prefix.trim().is_empty() {
            return Err(invalid("cache_prefix", "must not be empty"));
        }

        if self.release.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "release".into(),
                hint: "Set SHELLCACHE_RELEASE; it names the current cache generation".into(),
            });
        }

        if self.version_marker.is_empty() {
            return Err(invalid("version_marker", "must not be empty"));
        }

        if !self.worker_script.starts_with('/') {
            return Err(invalid("worker_script", "must be an absolute path"));
        }

        if !self.offline_document.starts_with('/') {
            return Err(invalid("offline_document", "must be an absolute path"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.install_concurrency == 0 || self.install_concurrency > 32 {
            return Err(invalid("install_concurrency", "must be between 1 and 32"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.manifest.iter().any(|entry| entry.trim().is_empty()) {
            return Err(invalid("manifest", "entries must not be blank"));
        }

        let mut seen = HashSet::new();
        for entry in &self.manifest {
            if !seen.insert(entry.as_str()) {
                tracing::warn!(entry = %entry, "duplicate manifest entry; it will be fetched twice");
            }
        }

        Ok(())
    }
}
