//! Host runtime for one proxy instance.
//!
//! Drives the lifecycle `uninstalled → installing → installed → activating → active`
//! and routes fetch events to the proxy once it is active. Until then every
//! request goes straight to the network.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{ActivateReport, InstallReport, Network, OfflineProxy, Outcome, Source};
use shellcache_core::{Error, Request, Response};
use tokio::sync::{Mutex, RwLock};

use crate::error::HostError;

/// Lifecycle phase of the hosted proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninstalled,
    Installing,
    Installed,
    Activating,
    Active,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Uninstalled => "uninstalled",
            LifecycleState::Installing => "installing",
            LifecycleState::Installed => "installed",
            LifecycleState::Activating => "activating",
            LifecycleState::Active => "active",
        };
        f.write_str(s)
    }
}

/// Snapshot of the host for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HostStatus {
    pub state: LifecycleState,
    /// When the host entered `state`.
    pub since: DateTime<Utc>,
    pub generation: String,
    pub scope: String,
    pub strategy: String,
    pub assets: usize,
}

/// A fetch event answered by the host.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub response: Response,
    /// `None` when the proxy did not handle the request.
    pub source: Option<Source>,
}

#[derive(Debug, Clone, Copy)]
struct Phase {
    state: LifecycleState,
    since: DateTime<Utc>,
}

/// Owns one [`OfflineProxy`] and its lifecycle.
pub struct Host<N> {
    proxy: OfflineProxy<N>,
    phase: RwLock<Phase>,
    transitions: Mutex<()>,
}

impl<N: Network> Host<N> {
    pub fn new(proxy: OfflineProxy<N>) -> Self {
        let phase = Phase { state: LifecycleState::Uninstalled, since: Utc::now() };
        Self { proxy, phase: RwLock::new(phase), transitions: Mutex::new(()) }
    }

    pub fn proxy(&self) -> &OfflineProxy<N> {
        &self.proxy
    }

    pub async fn state(&self) -> LifecycleState {
        self.phase.read().await.state
    }

    async fn enter(&self, state: LifecycleState) {
        let mut phase = self.phase.write().await;
        tracing::info!(from = %phase.state, to = %state, generation = self.proxy.generation(), "lifecycle transition");
        *phase = Phase { state, since: Utc::now() };
    }

    /// Run one install attempt.
    ///
    /// Rejected once the host is active; a running host is only replaced by a
    /// new deployment.
    pub async fn install(&self) -> Result<InstallReport, HostError> {
        let _guard = self.transitions.lock().await;
        self.install_locked().await
    }

    /// Install, retrying asset fetch failures up to `attempts` times in total.
    pub async fn install_with_retry(&self, attempts: u32, delay: Duration) -> Result<InstallReport, HostError> {
        let _guard = self.transitions.lock().await;
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.install_locked().await {
                Ok(report) => return Ok(report),
                Err(HostError::Proxy(e @ Error::AssetFetchFailed { .. })) if attempt < attempts => {
                    tracing::warn!(attempt, attempts, error = %e, "install failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn install_locked(&self) -> Result<InstallReport, HostError> {
        let state = self.state().await;
        if state == LifecycleState::Active {
            return Err(HostError::NotReady { operation: "install", state });
        }

        self.enter(LifecycleState::Installing).await;
        match self.proxy.install().await {
            Ok(report) => {
                self.enter(LifecycleState::Installed).await;
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(generation = self.proxy.generation(), error = %e, "install failed");
                self.enter(state).await;
                Err(e.into())
            }
        }
    }

    /// Install with retry, then activate. Failures are logged and leave the
    /// host serving passthrough until a later install.
    pub async fn boot(&self, attempts: u32, delay: Duration) {
        if let Err(e) = self.install_with_retry(attempts, delay).await {
            tracing::error!(error = %e, "install failed at boot");
            return;
        }
        if let Err(e) = self.activate().await {
            tracing::error!(error = %e, "activate failed at boot");
        }
    }

    /// Activate the installed generation. Running it again while active
    /// is allowed and deletes nothing new.
    pub async fn activate(&self) -> Result<ActivateReport, HostError> {
        let _guard = self.transitions.lock().await;
        let state = self.state().await;
        if !matches!(state, LifecycleState::Installed | LifecycleState::Active) {
            return Err(HostError::NotReady { operation: "activate", state });
        }

        self.enter(LifecycleState::Activating).await;
        match self.proxy.activate().await {
            Ok(report) => {
                self.enter(LifecycleState::Active).await;
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(generation = self.proxy.generation(), error = %e, "activate failed");
                self.enter(state).await;
                Err(e.into())
            }
        }
    }

    /// Answer a fetch event.
    pub async fn fetch(&self, request: &Request) -> Result<Fetched, HostError> {
        if self.state().await != LifecycleState::Active {
            return self.passthrough(request).await;
        }

        match self.proxy.intercept(request).await? {
            Outcome::Respond { response, source } => Ok(Fetched { response, source: Some(source) }),
            Outcome::Passthrough => self.passthrough(request).await,
        }
    }

    async fn passthrough(&self, request: &Request) -> Result<Fetched, HostError> {
        let response = self.proxy.network().fetch(request).await?;
        Ok(Fetched { response, source: None })
    }

    pub async fn status(&self) -> HostStatus {
        let phase = *self.phase.read().await;
        let deployment = self.proxy.deployment();
        HostStatus {
            state: phase.state,
            since: phase.since,
            generation: deployment.generation.clone(),
            scope: self.proxy.scope().to_string(),
            strategy: deployment.strategy.name().to_string(),
            assets: self.proxy.shell().len(),
        }
    }
}
