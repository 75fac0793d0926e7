//! Per-deployment proxy configuration.
//!
//! A deployment is loaded once, never mutated, and replaced wholesale when
//! a new generation ships.

use serde::{Deserialize, Serialize};
use url::Url;

use super::ConfigError;

/// How intercepted GET requests are routed between cache and network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Serve from cache; on a miss, return the network response without storing it.
    CacheFirst,

    /// Serve from cache; on a miss, store the network response and return it.
    CacheFirstWriteBack,

    /// Try the network; on failure serve the cached copy, then the offline document.
    NetworkFirst {
        #[serde(default)]
        offline_document: Option<String>,
        #[serde(default)]
        write_back: bool,
    },

    /// Navigations go network-first and fall back to the shell document, then
    /// the scope root. Everything else is cache-first with write-back.
    NavigationFallback { shell: String },

    /// Asset-list paths are cache-first with write-back; all other requests
    /// are network-first with write-back and an optional offline document.
    AppShell {
        #[serde(default)]
        offline_document: Option<String>,
    },
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::NavigationFallback { shell: "./index.html".into() }
    }
}

impl Strategy {
    /// Documents this strategy may serve as a fallback, in lookup order.
    pub fn fallback_documents(&self) -> Vec<&str> {
        match self {
            Strategy::CacheFirst | Strategy::CacheFirstWriteBack => Vec::new(),
            Strategy::NetworkFirst { offline_document, .. } | Strategy::AppShell { offline_document } => {
                offline_document.as_deref().into_iter().collect()
            }
            Strategy::NavigationFallback { shell } => vec![shell.as_str(), "./"],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache_first",
            Strategy::CacheFirstWriteBack => "cache_first_write_back",
            Strategy::NetworkFirst { .. } => "network_first",
            Strategy::NavigationFallback { .. } => "navigation_fallback",
            Strategy::AppShell { .. } => "app_shell",
        }
    }
}

/// Cache generation, app shell and routing for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Current generation name, e.g. `door-control-pwa-v2`.
    pub generation: String,

    /// Absolute base URL the asset list resolves against. Its origin is
    /// the only origin the proxy intercepts.
    pub scope: String,

    /// App shell, fetched and stored on install.
    #[serde(default)]
    pub assets: Vec<String>,

    /// Match cached entries without comparing query strings.
    #[serde(default)]
    pub ignore_search: bool,

    #[serde(default)]
    pub strategy: Strategy,
}

impl Default for Deployment {
    fn default() -> Self {
        Self {
            generation: "app-shell-v1".into(),
            scope: "http://localhost:8080/".into(),
            assets: vec!["./".into(), "./index.html".into()],
            ignore_search: false,
            strategy: Strategy::default(),
        }
    }
}

impl Deployment {
    /// Parsed scope URL.
    pub fn scope_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.scope).map_err(|e| ConfigError::Invalid {
            field: "deployment.scope".into(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid {
                field: "deployment.scope".into(),
                reason: format!("unsupported scheme: {scheme}"),
            }),
        }
    }

    /// Resolve a relative path against the scope, dropping any fragment.
    pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        let mut url = self.scope_url()?.join(path).map_err(|e| ConfigError::Invalid {
            field: "deployment.assets".into(),
            reason: format!("{path}: {e}"),
        })?;
        url.set_fragment(None);
        Ok(url)
    }

    /// The asset list resolved to absolute URLs, in declaration order.
    pub fn asset_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.assets.iter().map(|a| self.resolve(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_tagged_serde() {
        let toml = r#"
            kind = "navigation_fallback"
            shell = "./doorSet_pwa.html"
        "#;
        let strategy = toml_from_str(toml);
        assert_eq!(strategy, Strategy::NavigationFallback { shell: "./doorSet_pwa.html".into() });
    }

    fn toml_from_str(input: &str) -> Strategy {
        use figment::{
            Figment,
            providers::{Format, Toml},
        };
        Figment::from(Toml::string(input)).extract().unwrap()
    }

    #[test]
    fn test_network_first_defaults() {
        let strategy = toml_from_str("kind = \"network_first\"");
        assert_eq!(strategy, Strategy::NetworkFirst { offline_document: None, write_back: false });
        assert!(strategy.fallback_documents().is_empty());
    }

    #[test]
    fn test_navigation_fallback_documents() {
        let strategy = Strategy::NavigationFallback { shell: "./doorSet_pwa.html".into() };
        assert_eq!(strategy.fallback_documents(), vec!["./doorSet_pwa.html", "./"]);
    }

    #[test]
    fn test_resolve_relative_assets() {
        let deployment = Deployment {
            scope: "https://mesh.local/loraMesh/".into(),
            assets: vec!["./".into(), "./loraMesh.html".into(), "/loraMesh/manifest.json".into()],
            ..Default::default()
        };
        let urls: Vec<String> = deployment
            .asset_urls()
            .unwrap()
            .into_iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://mesh.local/loraMesh/",
                "https://mesh.local/loraMesh/loraMesh.html",
                "https://mesh.local/loraMesh/manifest.json",
            ]
        );
    }

    #[test]
    fn test_scope_rejects_non_http() {
        let deployment = Deployment { scope: "file:///srv/app/".into(), ..Default::default() };
        assert!(matches!(deployment.scope_url(), Err(ConfigError::Invalid { .. })));
    }
}
