//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::collections::HashSet;

use crate::config::{AppConfig, Deployment, Strategy};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 100MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `install_attempts` is 0
    /// - the deployment is invalid (see [`Deployment::validate`])
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 100MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.install_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "install_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }

        self.deployment.validate()
    }
}

impl Deployment {
    /// Validate the deployment.
    ///
    /// The generation must be non-empty, the scope an absolute http(s) URL,
    /// and every asset and fallback document must resolve under the scope's
    /// origin.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "deployment.generation".into(),
                reason: "must not be empty".into(),
            });
        }

        let scope = self.scope_url()?;
        let origin = scope.origin();

        let mut seen = HashSet::new();
        for (asset, url) in self.assets.iter().zip(self.asset_urls()?) {
            if url.origin() != origin {
                return Err(ConfigError::Invalid {
                    field: "deployment.assets".into(),
                    reason: format!("{asset} resolves outside {}", origin.ascii_serialization()),
                });
            }
            if !seen.insert(url.clone()) {
                tracing::warn!(asset = %asset, url = %url, "duplicate asset in app shell");
            }
        }

        for document in self.strategy.fallback_documents() {
            let url = self.resolve(document)?;
            if url.origin() != origin {
                return Err(ConfigError::Invalid {
                    field: "deployment.strategy".into(),
                    reason: format!("fallback {document} resolves outside {}", origin.ascii_serialization()),
                });
            }
            if !seen.contains(&url) {
                tracing::warn!(
                    document = %document,
                    "fallback document is not in the asset list; it is only served once a network fetch stored it"
                );
            }
        }

        if self.strategy == Strategy::CacheFirst {
            tracing::warn!(
                generation = %self.generation,
                "cache_first never writes network responses back; misses stay misses until the next install"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_zero_install_attempts() {
        let config = AppConfig { install_attempts: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "install_attempts"));
    }

    #[test]
    fn test_validate_empty_generation() {
        let deployment = Deployment { generation: " ".into(), ..Default::default() };
        let result = deployment.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "deployment.generation"));
    }

    #[test]
    fn test_validate_cross_origin_asset() {
        let deployment = Deployment {
            scope: "https://door.local/".into(),
            assets: vec!["./".into(), "https://cdn.example.com/lib.js".into()],
            ..Default::default()
        };
        let result = deployment.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "deployment.assets"));
    }

    #[test]
    fn test_validate_cross_origin_fallback() {
        let deployment = Deployment {
            strategy: Strategy::NetworkFirst {
                offline_document: Some("https://elsewhere.example/offline.html".into()),
                write_back: false,
            },
            ..Default::default()
        };
        let result = deployment.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "deployment.strategy"));
    }

    #[test]
    fn test_validate_cache_first_is_allowed() {
        let deployment = Deployment { strategy: Strategy::CacheFirst, ..Default::default() };
        assert!(deployment.validate().is_ok());
    }

    #[test]
    fn test_validate_max_values() {
        let config = AppConfig { max_bytes: 100 * 1024 * 1024, timeout_ms: 300_000, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
