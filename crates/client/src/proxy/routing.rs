//! Per-request routing between cache and network.

use serde::Serialize;
use shellcache_core::{Error, MatchOptions, Request, Response, Strategy};

use super::OfflineProxy;
use crate::fetch::{Network, is_same_origin, path_in};

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Cache,
    Network,
    /// A designated shell or offline document served in place of the request.
    Fallback,
}

/// What the proxy decided for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Not intercepted; the host handles the request as if no proxy existed.
    Passthrough,
    Respond { response: Response, source: Source },
}

impl Outcome {
    fn cache(response: Response) -> Self {
        Outcome::Respond { response, source: Source::Cache }
    }

    fn network(response: Response) -> Self {
        Outcome::Respond { response, source: Source::Network }
    }

    fn fallback(response: Response) -> Self {
        Outcome::Respond { response, source: Source::Fallback }
    }
}

impl<N: Network> OfflineProxy<N> {
    /// Decide how to answer a client request.
    ///
    /// Non-GET and cross-origin requests pass through. Everything else goes
    /// through the deployment's strategy. A network failure resolves to a
    /// cached or fallback response where one exists; otherwise the network
    /// error is returned.
    pub async fn intercept(&self, request: &Request) -> Result<Outcome, Error> {
        if !request.is_get() {
            tracing::debug!(method = %request.method, url = %request.url, "passthrough: not GET");
            return Ok(Outcome::Passthrough);
        }
        if !is_same_origin(&request.url, &self.scope) {
            tracing::debug!(url = %request.url, "passthrough: cross-origin");
            return Ok(Outcome::Passthrough);
        }

        let opts = self.match_options();
        match &self.deployment.strategy {
            Strategy::CacheFirst => self.cache_first(request, opts, false).await,
            Strategy::CacheFirstWriteBack => self.cache_first(request, opts, true).await,
            Strategy::NetworkFirst { write_back, .. } => self.network_first(request, opts, *write_back).await,
            Strategy::NavigationFallback { .. } => {
                if request.is_navigation() {
                    self.network_first(request, opts, true).await
                } else {
                    self.cache_first(request, opts, true).await
                }
            }
            Strategy::AppShell { .. } => {
                let opts = MatchOptions { ignore_search: true };
                if path_in(&request.url, &self.shell) {
                    self.cache_first(request, opts, true).await
                } else {
                    self.network_first(request, opts, true).await
                }
            }
        }
    }

    async fn cache_first(&self, request: &Request, opts: MatchOptions, write_back: bool) -> Result<Outcome, Error> {
        if let Some(hit) = self.current().match_request(request, opts).await? {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(Outcome::cache(hit));
        }

        tracing::debug!(url = %request.url, "cache miss");
        let response = self.network.fetch(request).await?;
        if write_back {
            self.store(request, &response).await;
        }
        Ok(Outcome::network(response))
    }

    async fn network_first(&self, request: &Request, opts: MatchOptions, write_back: bool) -> Result<Outcome, Error> {
        let err = match self.network.fetch(request).await {
            Ok(response) => {
                if write_back {
                    self.store(request, &response).await;
                }
                return Ok(Outcome::network(response));
            }
            Err(e) if e.is_network_failure() => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(url = %request.url, error = %err, "network failed, falling back to cache");

        let cache = self.current();
        if let Some(hit) = cache.match_request(request, opts).await? {
            return Ok(Outcome::cache(hit));
        }
        for document in &self.fallbacks {
            if let Some(hit) = cache.match_url(document, MatchOptions::default()).await? {
                tracing::debug!(url = %request.url, fallback = %document, "serving fallback document");
                return Ok(Outcome::fallback(hit));
            }
        }

        Err(err)
    }

    /// Write a successful response into the current generation.
    ///
    /// Failures are logged; the response is still returned to the client.
    async fn store(&self, request: &Request, response: &Response) {
        if !response.is_ok() {
            return;
        }
        let result = match self.db.open_generation(self.generation()).await {
            Ok(cache) => cache.put(request, response).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(url = %request.url, error = %e, "write-back failed");
        }
    }
}
