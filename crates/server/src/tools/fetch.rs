//! sw_fetch tool implementation.
//!
//! Issues one client request through the host, as a page under the
//! deployment's scope would.

use std::time::Instant;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::fetch::canonicalize;
use shellcache_client::{Network, Source};
use shellcache_core::{Error, Request, RequestMode, Response};

use super::json_result;
use crate::host::Host;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to request, absolute or relative to the deployment scope.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin" (default), "cors" or "no-cors".
    #[serde(default)]
    pub mode: RequestMode,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// URL the response was produced for, if known.
    pub response_url: Option<String>,
    pub status: u16,
    /// "cache", "network", "fallback" or "passthrough".
    pub source: String,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Response body decoded as UTF-8, lossily.
    pub body: String,
    pub body_len: usize,
    pub fetch_ms: u64,
}

fn source_name(source: Option<Source>) -> &'static str {
    match source {
        Some(Source::Cache) => "cache",
        Some(Source::Network) => "network",
        Some(Source::Fallback) => "fallback",
        None => "passthrough",
    }
}

impl SwFetchOutput {
    fn new(url: String, response: Response, source: Option<Source>, fetch_ms: u64) -> Self {
        Self {
            url,
            response_url: response.url.as_ref().map(|u| u.to_string()),
            status: response.status,
            source: source_name(source).to_string(),
            content_type: response.content_type().map(str::to_string),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            body_len: response.body.len(),
            headers: response.headers,
            fetch_ms,
        }
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<N: Network>(host: &Host<N>, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }
    let url = canonicalize(&params.url, host.proxy().scope()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let request = Request::new(params.method.trim(), url, params.mode);

    let start = Instant::now();
    let fetched = host.fetch(&request).await?;
    let fetch_ms = start.elapsed().as_millis() as u64;

    tracing::debug!(
        method = %request.method,
        url = %request.url,
        status = fetched.response.status,
        source = source_name(fetched.source),
        fetch_ms,
        "sw_fetch"
    );

    json_result(&SwFetchOutput::new(request.url.to_string(), fetched.response, fetched.source, fetch_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::tests::{host, network};

    fn params(url: &str, mode: RequestMode) -> SwFetchParams {
        SwFetchParams { url: url.into(), method: default_method(), mode }
    }

    #[tokio::test]
    async fn test_fetch_before_activate_passes_through() {
        let host = host(network()).await;
        let result = fetch_impl(&host, params("./state.json", RequestMode::SameOrigin)).await.unwrap();
        let output: SwFetchOutput = crate::tools::parse_output(&result);

        assert_eq!(output.source, "passthrough");
        assert_eq!(output.url, "https://remote.local/uniRMC/state.json");
        assert_eq!(output.body, "{\"power\":\"on\"}");
    }

    #[tokio::test]
    async fn test_fetch_offline_serves_offline_document() {
        let net = network();
        let host = host(net.clone()).await;
        host.install().await.unwrap();
        host.activate().await.unwrap();
        net.set_offline(true);

        let result = fetch_impl(&host, params("./settings", RequestMode::Navigate)).await.unwrap();
        let output: SwFetchOutput = crate::tools::parse_output(&result);
        assert_eq!(output.source, "fallback");
        assert_eq!(output.body, "shell");
        assert_eq!(output.status, 200);
    }

    #[tokio::test]
    async fn test_fetch_offline_without_fallback_reports_network_error() {
        let net = network();
        let host = host(net.clone()).await;
        net.set_offline(true);

        let err = fetch_impl(&host, params("./state.json", RequestMode::SameOrigin)).await.unwrap_err();
        assert_eq!(err.code.0, -32000);
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_url() {
        let host = host(network()).await;
        let err = fetch_impl(&host, params("ftp://remote.local/file", RequestMode::SameOrigin))
            .await
            .unwrap_err();
        assert_eq!(err.code.0, -32003);
    }
}
