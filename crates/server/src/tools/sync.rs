//! sw_sync tool implementation.

use haven_client::Host;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for the sw_sync tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Sync tag to deliver (default: the configured tag).
    #[serde(default)]
    pub tag: Option<String>,
}

/// Output structure for the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncOutput {
    pub tag: String,
    /// Whether the worker acted on the tag.
    pub recognized: bool,
}

/// Implementation of the sw_sync tool.
pub async fn sync_impl(host: &Host, default_tag: &str, params: SwSyncParams) -> Result<CallToolResult, McpError> {
    let tag = params.tag.unwrap_or_else(|| default_tag.to_string());
    let recognized = host.dispatch_sync(&tag).await?;

    json_result(&SwSyncOutput { tag, recognized })
}
