//! sw_install and sw_activate tool implementations.

use haven_client::Host;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Output structure for the lifecycle tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LifecycleOutput {
    /// Worker state after the event.
    pub state: String,
    /// Generations removed by activation.
    #[serde(default)]
    pub deleted: Vec<String>,
    /// Whether the current generation has a store after activation.
    #[serde(default)]
    pub kept: Option<String>,
}

/// Implementation of the sw_install tool.
pub async fn install_impl(host: &Host) -> Result<CallToolResult, McpError> {
    host.install().await?;

    let output = LifecycleOutput { state: host.state().await.to_string(), deleted: Vec::new(), kept: None };
    json_result(&output)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(host: &Host) -> Result<CallToolResult, McpError> {
    let report = host.activate().await?.unwrap_or_default();

    let output = LifecycleOutput { state: host.state().await.to_string(), deleted: report.deleted, kept: report.kept };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{absolute, host, output};
    use super::*;
    use haven_core::{Request, Response, ResponseType};

    #[tokio::test]
    async fn test_install_then_activate() {
        let (host, _pages, db, _config) = host("v2").await;
        db.open_store("v1")
            .put(&Request::get(absolute("/")), Response::new(200, ResponseType::Basic, "old"))
            .await
            .unwrap();

        let installed: LifecycleOutput = output(&install_impl(&host).await.unwrap());
        assert_eq!(installed.state, "installed");

        let activated: LifecycleOutput = output(&activate_impl(&host).await.unwrap());
        assert_eq!(activated.state, "activated");
        assert_eq!(activated.deleted, vec!["v1"]);
        assert_eq!(activated.kept.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_activate_before_install_fails() {
        let (host, _pages, _db, _config) = host("v1").await;

        let err = activate_impl(&host).await.unwrap_err();
        assert_eq!(err.code.0, -32012);
    }

    #[tokio::test]
    async fn test_install_offline_fails() {
        let (host, pages, db, _config) = host("v1").await;
        pages.set_offline(true);

        let err = install_impl(&host).await.unwrap_err();
        assert_eq!(err.code.0, -32010);
        assert!(!db.has_store("v1").await.unwrap());
    }
}
