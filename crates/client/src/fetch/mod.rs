//! Network access for the worker.
//!
//! ### Network seam
//! - The worker only talks to the network through the [`Network`] trait, so the
//!   interception engine can be exercised offline and with call counters.
//!
//! ### FetchClient
//! - reqwest with rustls, gzip/brotli/deflate and a bounded redirect policy.
//! - Non-success statuses are responses, not errors; only a missing response
//!   is a [`NetworkError`].
//! - Max body bytes: 10MB (configurable)
//!
//! ### Response classification
//! - Final URL on the application origin: `basic`
//! - Cross-origin in `no-cors` mode: `opaque` (status 0, no headers, empty body)
//! - Any other cross-origin response: `cors`

pub mod error;
pub mod url;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use haven_core::{AppConfig, Error, Request, RequestMode, Response, ResponseType};
use reqwest::{Client, Method, Url, header};

pub use error::NetworkError;
pub use self::url::{UrlError, resolve, same_origin};

/// Anything that can turn a request into a live response.
#[async_trait]
pub trait Network: Send + Sync {
    /// Issue `request`, consuming it.
    async fn fetch(&self, request: Request) -> Result<Response, NetworkError>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Origin used to classify responses as same-origin
    pub origin: Url,

    /// User agent string (default: "haven/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl FetchConfig {
    /// Derive the client settings from the application configuration.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = config
            .origin_url()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self {
            origin,
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        })
    }
}

/// Classify a response by where it finally came from and how it was requested.
pub fn classify(origin: &Url, final_url: &Url, mode: RequestMode) -> ResponseType {
    if same_origin(origin, final_url) {
        ResponseType::Basic
    } else if mode == RequestMode::NoCors {
        ResponseType::Opaque
    } else {
        ResponseType::Cors
    }
}

fn header_map_to_btree(headers: &header::HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else { continue };
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    out
}

/// reqwest-backed network.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, mut request: Request) -> Result<Response, NetworkError> {
        let start = Instant::now();

        if request.mode == RequestMode::SameOrigin && !same_origin(&self.config.origin, &request.url) {
            return Err(NetworkError::InvalidRequest(format!(
                "cross-origin request in same-origin mode: {}",
                request.url
            )));
        }

        let method =
            Method::from_bytes(request.method.as_bytes()).map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;
        let body = request
            .body
            .take()
            .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let response = builder.send().await?;

        let status = response.status();
        let final_url = response.url().clone();
        let response_type = classify(&self.config.origin, &final_url, request.mode);

        if response_type == ResponseType::Opaque {
            tracing::debug!(url = %request.url, "opaque cross-origin response");
            return Ok(Response::opaque());
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(NetworkError::TooLarge { size: len as usize, limit: self.config.max_bytes });
        }

        let headers = header_map_to_btree(response.headers());
        let bytes = response.bytes().await?;

        if bytes.len() > self.config.max_bytes {
            return Err(NetworkError::TooLarge { size: bytes.len(), limit: self.config.max_bytes });
        }

        tracing::debug!(
            "fetched {} {} -> {} {} in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            response_type,
            url: Some(final_url),
            body: bytes.into(),
        })
    }
}
