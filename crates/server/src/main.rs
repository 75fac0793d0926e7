//! shellcache server entry point.
//!
//! Loads configuration, installs and activates the configured deployment,
//! then serves the MCP tool surface on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{FetchClient, FetchConfig, Network, OfflineProxy};
use shellcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod host;
mod tools;

use host::Host;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        db_path = %config.db_path.display(),
        generation = %config.deployment.generation,
        scope = %config.deployment.scope,
        strategy = config.deployment.strategy.name(),
        "Starting shellcache server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let proxy = OfflineProxy::new(Arc::new(config.deployment.clone()), db, network)?;
    let host = Arc::new(Host::new(proxy));

    let booting = host.clone();
    let (attempts, delay) = (config.install_attempts, config.install_retry_delay());
    tokio::spawn(async move { booting.boot(attempts, delay).await });

    let handler = handler::ShellCacheServer::new(host);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
