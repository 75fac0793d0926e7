//! Offline cache proxy.
//!
//! One service object per deployment. It holds no state between calls
//! beyond the cache store:
//!
//! - [`OfflineProxy::install`] pre-caches the app shell into the current generation
//! - [`OfflineProxy::activate`] drops every other generation
//! - [`OfflineProxy::intercept`] routes a client request through the configured strategy

mod lifecycle;
mod routing;

pub use lifecycle::{ActivateReport, InstallReport};
pub use routing::{Outcome, Source};

use std::sync::Arc;

use shellcache_core::{CacheDb, Deployment, Error, GenerationCache, MatchOptions};
use url::Url;

use crate::fetch::Network;

/// Install, activate and intercept for one deployment.
pub struct OfflineProxy<N> {
    deployment: Arc<Deployment>,
    scope: Url,
    shell: Vec<Url>,
    fallbacks: Vec<Url>,
    db: CacheDb,
    network: N,
}

impl<N: Network> OfflineProxy<N> {
    /// Build a proxy for a validated deployment.
    ///
    /// Resolves the asset list and fallback documents against the scope
    /// once; duplicates in the asset list are dropped, keeping the first.
    pub fn new(deployment: Arc<Deployment>, db: CacheDb, network: N) -> Result<Self, Error> {
        deployment.validate()?;

        let scope = deployment.scope_url()?;
        let mut shell: Vec<Url> = Vec::with_capacity(deployment.assets.len());
        for url in deployment.asset_urls()? {
            if !shell.contains(&url) {
                shell.push(url);
            }
        }
        let fallbacks = deployment
            .strategy
            .fallback_documents()
            .into_iter()
            .map(|doc| deployment.resolve(doc))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { deployment, scope, shell, fallbacks, db, network })
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// Name of the current generation.
    pub fn generation(&self) -> &str {
        &self.deployment.generation
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    /// Resolved app shell URLs, in install order.
    pub fn shell(&self) -> &[Url] {
        &self.shell
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    fn current(&self) -> GenerationCache {
        self.db.generation(self.generation())
    }

    fn match_options(&self) -> MatchOptions {
        MatchOptions { ignore_search: self.deployment.ignore_search }
    }
}
