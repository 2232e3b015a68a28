//! cache_get tool implementation.
//!
//! Retrieves a stored entry's metadata by URL.

use haven_client::fetch::resolve;
use haven_core::{CacheDb, Error, Version, cache::EntryMeta};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a path relative to the application origin.
    pub url: String,

    /// Generation to look in (default: the current one).
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub store: String,
    pub entry: EntryMeta,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(
    cache: &CacheDb, origin: &Url, version: &Version, params: CacheGetParams,
) -> Result<CallToolResult, McpError> {
    let url = resolve(origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let name = params.store.unwrap_or_else(|| version.to_string());

    let entry = cache
        .open_store(&name)
        .entries()
        .await?
        .into_iter()
        .find(|entry| entry.url == url.as_str())
        .ok_or_else(|| Error::CacheMiss(format!("{url} in {name}")))?;

    json_result(&CacheGetOutput { store: name, entry })
}
