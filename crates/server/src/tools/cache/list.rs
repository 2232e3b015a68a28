//! cache_list tool implementation.
//!
//! Lists every stored generation with its entry count.

use haven_core::{CacheDb, Version};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// One stored generation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: u64,
    pub created_at: String,
    /// Whether this is the generation the worker serves from.
    pub current: bool,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    /// The worker's current generation name.
    pub version: String,
    pub stores: Vec<StoreSummary>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(cache: &CacheDb, version: &Version) -> Result<CallToolResult, McpError> {
    let stores = cache
        .list_stores()
        .await?
        .into_iter()
        .map(|info| StoreSummary {
            current: version.is_current(&info.name),
            name: info.name,
            entries: info.entries,
            created_at: info.created_at,
        })
        .collect();

    json_result(&CacheListOutput { version: version.to_string(), stores })
}
