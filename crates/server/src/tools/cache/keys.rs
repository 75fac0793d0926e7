//! cache_keys tool implementation.
//!
//! Lists stored generations with their entry counts.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::Network;
use shellcache_core::GenerationInfo;

use crate::host::Host;
use crate::tools::json_result;

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// Generation the proxy reads and writes.
    pub current: String,
    /// Stored generations, in creation order.
    pub generations: Vec<GenerationInfo>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl<N: Network>(host: &Host<N>) -> Result<CallToolResult, McpError> {
    let generations = host.proxy().db().generation_stats().await?;
    let output = CacheKeysOutput { current: host.proxy().generation().to_string(), generations };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::tests::{host, network};
    use crate::tools::parse_output;

    #[tokio::test]
    async fn test_keys_empty_before_install() {
        let host = host(network()).await;
        let output: CacheKeysOutput = parse_output(&keys_impl(&host).await.unwrap());
        assert_eq!(output.current, "uniRMC-pwa-v1");
        assert!(output.generations.is_empty());
    }

    #[tokio::test]
    async fn test_keys_after_activate() {
        let host = host(network()).await;
        host.proxy().db().open_generation("uniRMC-pwa-v0").await.unwrap();
        host.install().await.unwrap();

        let before: CacheKeysOutput = parse_output(&keys_impl(&host).await.unwrap());
        assert_eq!(before.generations.len(), 2);

        host.activate().await.unwrap();
        let after: CacheKeysOutput = parse_output(&keys_impl(&host).await.unwrap());
        assert_eq!(after.generations.len(), 1);
        assert_eq!(after.generations[0].name, "uniRMC-pwa-v1");
        assert_eq!(after.generations[0].entries, 2);
    }
}
