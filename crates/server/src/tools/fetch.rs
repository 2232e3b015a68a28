//! sw_fetch tool implementation.
//!
//! Dispatches a fetch event through the host, as a page under the worker's
//! control would.

use std::collections::BTreeMap;

use haven_client::{Host, fetch::resolve};
use haven_core::{Error, Request, RequestMode};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

use super::json_result;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path relative to the application origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin", "cors" (default) or "no-cors".
    #[serde(default = "default_mode")]
    pub mode: RequestMode,

    /// Optional request body.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

fn default_mode() -> RequestMode {
    RequestMode::Cors
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// Where the answer came from: "cache", "network" or "fallback".
    pub source: String,
    pub status: u16,
    pub status_text: String,
    /// "basic", "cors", "opaque" or "error".
    pub response_type: String,
    pub headers: BTreeMap<String, String>,
    /// Body decoded as lossy UTF-8.
    pub body: String,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(host: &Host, origin: &Url, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let method = params.method.trim();
    if method.is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()).into());
    }

    let url = resolve(origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut request = Request::new(method, url.clone(), params.mode);
    if let Some(body) = params.body {
        request = request.with_body(body);
    }

    let dispatched = host.dispatch_fetch(request).await?;
    let Some(mut response) = dispatched.response else {
        return Err(Error::Network(format!("no response for {url}")).into());
    };

    let body = response.text().map_err(Error::from)?;

    let output = SwFetchOutput {
        url: url.to_string(),
        source: dispatched.source.to_string(),
        status: response.status,
        status_text: response.status_text.clone(),
        response_type: response.response_type.to_string(),
        headers: response.headers.clone(),
        body,
    };

    json_result(&output)
}
