//! MCP tool implementations.
//!
//! This module contains all tools exposed by the haven server.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use haven_core::Error;

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{SwFetchOutput, SwFetchParams};
pub use lifecycle::LifecycleOutput;
pub use sync::{SwSyncOutput, SwSyncParams};

/// Wrap a tool's output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
