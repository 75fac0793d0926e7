//! sw_install, sw_activate and sw_status tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use shellcache_client::Network;

use super::json_result;
use crate::host::Host;

/// Pre-cache the app shell into the current generation.
pub async fn install_impl<N: Network>(host: &Host<N>) -> Result<CallToolResult, McpError> {
    let report = host.install().await?;
    json_result(&report)
}

/// Delete every generation but the current one and start intercepting.
pub async fn activate_impl<N: Network>(host: &Host<N>) -> Result<CallToolResult, McpError> {
    let report = host.activate().await?;
    json_result(&report)
}

pub async fn status_impl<N: Network>(host: &Host<N>) -> Result<CallToolResult, McpError> {
    json_result(&host.status().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::tests::{host, network};
    use crate::host::{HostStatus, LifecycleState};
    use crate::tools::parse_output;

    #[tokio::test]
    async fn test_install_then_activate() {
        let host = host(network()).await;

        let installed: serde_json::Value = parse_output(&install_impl(&host).await.unwrap());
        assert_eq!(installed["generation"], "uniRMC-pwa-v1");
        assert_eq!(installed["assets"].as_array().unwrap().len(), 2);
        assert_eq!(installed["skip_waiting"], true);

        let activated: serde_json::Value = parse_output(&activate_impl(&host).await.unwrap());
        assert_eq!(activated["deleted"], serde_json::json!([]));
        assert_eq!(activated["claim_clients"], true);

        let status: HostStatus = parse_output(&status_impl(&host).await.unwrap());
        assert_eq!(status.state, LifecycleState::Active);
    }

    #[tokio::test]
    async fn test_activate_before_install_is_invalid_state() {
        let host = host(network()).await;
        let err = activate_impl(&host).await.unwrap_err();
        assert_eq!(err.code.0, -32013);
    }

    #[tokio::test]
    async fn test_install_failure_reports_asset() {
        let net = network();
        net.fail("https://remote.local/uniRMC/");
        let host = host(net).await;

        let err = install_impl(&host).await.unwrap_err();
        assert_eq!(err.code.0, -32004);
        assert!(err.message.contains("https://remote.local/uniRMC/"));
    }
}
