//! cache_delete tool implementation.
//!
//! Deletes one generation and all of its entries.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::Network;
use shellcache_core::Error;

use crate::host::Host;
use crate::tools::json_result;

/// Parameters for the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteParams {
    /// Name of the generation to delete.
    pub generation: String,
}

/// Output from the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteOutput {
    pub generation: String,
    /// False if no generation had that name.
    pub deleted: bool,
}

/// Implementation of the cache_delete tool.
pub async fn delete_impl<N: Network>(host: &Host<N>, params: CacheDeleteParams) -> Result<CallToolResult, McpError> {
    let generation = params.generation.trim().to_string();
    if generation.is_empty() {
        return Err(Error::InvalidInput("generation cannot be empty".to_string()).into());
    }
    if generation == host.proxy().generation() {
        tracing::warn!(generation = %generation, "deleting the current generation");
    }

    let deleted = host.proxy().db().delete(&generation).await?;
    json_result(&CacheDeleteOutput { generation, deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::tests::{host, network};
    use crate::tools::parse_output;

    #[tokio::test]
    async fn test_delete_existing_and_missing() {
        let host = host(network()).await;
        host.proxy().db().open_generation("uniRMC-pwa-v0").await.unwrap();

        let params = CacheDeleteParams { generation: "uniRMC-pwa-v0".into() };
        let output: CacheDeleteOutput = parse_output(&delete_impl(&host, params.clone()).await.unwrap());
        assert!(output.deleted);

        let again: CacheDeleteOutput = parse_output(&delete_impl(&host, params).await.unwrap());
        assert!(!again.deleted);
    }

    #[tokio::test]
    async fn test_delete_empty_name() {
        let host = host(network()).await;
        let err = delete_impl(&host, CacheDeleteParams { generation: " ".into() }).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
