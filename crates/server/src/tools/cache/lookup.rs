//! cache_match tool implementation.
//!
//! Looks up a stored response without touching the network.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::Network;
use shellcache_client::fetch::canonicalize;
use shellcache_core::{Error, MatchOptions};

use crate::host::Host;
use crate::tools::json_result;

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// URL to look up, absolute or relative to the deployment scope.
    pub url: String,

    /// Generation to search (default: the current one).
    #[serde(default)]
    pub generation: Option<String>,

    /// Ignore query strings when matching (default: the deployment setting).
    #[serde(default)]
    pub ignore_search: Option<bool>,
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchOutput {
    pub generation: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub body_len: usize,
}

/// Implementation of the cache_match tool.
pub async fn match_impl<N: Network>(host: &Host<N>, params: CacheMatchParams) -> Result<CallToolResult, McpError> {
    let proxy = host.proxy();
    let url = canonicalize(&params.url, proxy.scope()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let generation = params.generation.unwrap_or_else(|| proxy.generation().to_string());
    let opts = MatchOptions { ignore_search: params.ignore_search.unwrap_or(proxy.deployment().ignore_search) };

    let response = proxy
        .db()
        .generation(&generation)
        .match_url(&url, opts)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{url} in {generation}")))?;

    let output = CacheMatchOutput {
        generation,
        url: url.to_string(),
        status: response.status,
        content_type: response.content_type().map(str::to_string),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        body_len: response.body.len(),
        headers: response.headers,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::tests::{host, network};
    use crate::tools::parse_output;

    fn params(url: &str) -> CacheMatchParams {
        CacheMatchParams { url: url.into(), generation: None, ignore_search: None }
    }

    #[tokio::test]
    async fn test_match_installed_asset() {
        let host = host(network()).await;
        host.install().await.unwrap();

        let output: CacheMatchOutput = parse_output(&match_impl(&host, params("./uniRMC_pwa.html")).await.unwrap());
        assert_eq!(output.generation, "uniRMC-pwa-v1");
        assert_eq!(output.body, "shell");
    }

    #[tokio::test]
    async fn test_match_miss() {
        let host = host(network()).await;
        host.install().await.unwrap();

        let err = match_impl(&host, params("./state.json")).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_match_ignore_search_override() {
        let host = host(network()).await;
        host.install().await.unwrap();

        let strict = match_impl(&host, params("./uniRMC_pwa.html?source=pwa")).await;
        assert!(strict.is_err());

        let loose = CacheMatchParams { ignore_search: Some(true), ..params("./uniRMC_pwa.html?source=pwa") };
        let output: CacheMatchOutput = parse_output(&match_impl(&host, loose).await.unwrap());
        assert_eq!(output.body, "shell");
    }

    #[tokio::test]
    async fn test_match_other_generation_does_not_create_it() {
        let host = host(network()).await;
        host.install().await.unwrap();

        let other = CacheMatchParams { generation: Some("uniRMC-pwa-v0".into()), ..params("./") };
        assert!(match_impl(&host, other).await.is_err());
        assert!(!host.proxy().db().has("uniRMC-pwa-v0").await.unwrap());
    }
}
