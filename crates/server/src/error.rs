//! Structured errors for the shellcache host.

use rmcp::model::ErrorData as McpError;
use shellcache_core::Error;

use crate::host::LifecycleState;

/// Errors raised by the host runtime.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The requested transition is not allowed from the current state.
    #[error("{operation} not allowed while {state}")]
    NotReady { operation: &'static str, state: LifecycleState },

    /// Error from the proxy or the cache store.
    #[error(transparent)]
    Proxy(#[from] Error),
}

impl From<HostError> for McpError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::NotReady { .. } => Error::InvalidState(err.to_string()).into(),
            HostError::Proxy(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_maps_to_invalid_state() {
        let err = HostError::NotReady { operation: "activate", state: LifecycleState::Uninstalled };
        let mcp: McpError = err.into();
        assert_eq!(mcp.code.0, -32013);
        assert_eq!(mcp.message, "INVALID_STATE: activate not allowed while uninstalled");
    }

    #[test]
    fn test_proxy_error_keeps_code() {
        let err = HostError::from(Error::NetworkUnavailable("offline".into()));
        let mcp: McpError = err.into();
        assert_eq!(mcp.code.0, -32000);
    }
}
