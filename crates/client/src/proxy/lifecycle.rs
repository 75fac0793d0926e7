//! Install and activate.

use futures_util::future::join_all;
use serde::Serialize;
use shellcache_core::{Error, Request};

use super::OfflineProxy;
use crate::fetch::Network;

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub generation: String,
    /// Asset URLs now stored, in install order.
    pub assets: Vec<String>,
    /// The new instance replaces the active one without waiting for clients to close.
    pub skip_waiting: bool,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    pub generation: String,
    /// Generations removed by this activation.
    pub deleted: Vec<String>,
    /// Open clients are controlled immediately, without a reload.
    pub claim_clients: bool,
}

impl<N: Network> OfflineProxy<N> {
    /// Fetch every app shell asset and store the set in the current generation.
    ///
    /// All assets are fetched concurrently. A rejected fetch, a non-2xx
    /// status or a partial (206) response aborts the install and nothing
    /// from this attempt is stored.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let generation = self.generation().to_string();
        tracing::info!(generation = %generation, assets = self.shell.len(), "installing app shell");

        let cache = self.db.open_generation(&generation).await?;
        let requests: Vec<Request> = self.shell.iter().cloned().map(Request::get).collect();
        let results = join_all(requests.iter().map(|req| self.network.fetch(req))).await;

        let mut pairs = Vec::with_capacity(requests.len());
        for (request, result) in requests.into_iter().zip(results) {
            let response = result.map_err(|e| Error::AssetFetchFailed {
                url: request.url.to_string(),
                reason: e.to_string(),
            })?;
            if !response.is_ok() || response.status == 206 {
                return Err(Error::AssetFetchFailed {
                    url: request.url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            pairs.push((request, response));
        }

        cache.put_all(&pairs).await?;

        tracing::info!(generation = %generation, stored = pairs.len(), "install complete");

        Ok(InstallReport {
            generation,
            assets: pairs.iter().map(|(req, _)| req.url.to_string()).collect(),
            skip_waiting: true,
        })
    }

    /// Make the current generation the only one.
    ///
    /// Opens the current generation if absent and deletes every other one.
    /// Running it again deletes nothing.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        let generation = self.generation().to_string();
        self.db.open_generation(&generation).await?;

        let stale: Vec<String> = self
            .db
            .keys()
            .await?
            .into_iter()
            .filter(|name| *name != generation)
            .collect();

        for result in join_all(stale.iter().map(|name| self.db.delete(name))).await {
            result?;
        }

        if !stale.is_empty() {
            tracing::info!(generation = %generation, deleted = ?stale, "purged stale generations");
        }

        Ok(ActivateReport { generation, deleted: stale, claim_clients: true })
    }
}
