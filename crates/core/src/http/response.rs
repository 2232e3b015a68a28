//! Responses returned to intercepted requests.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use super::body::{Body, BodyError};

/// Visibility category of a response relative to the requesting origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response; fully readable.
    Basic,
    /// Cross-origin response readable through CORS.
    Cors,
    /// Cross-origin response whose status and body are hidden.
    Opaque,
    Error,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
            ResponseType::Error => "error",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ResponseType::Basic),
            "cors" => Ok(ResponseType::Cors),
            "opaque" => Ok(ResponseType::Opaque),
            "error" => Ok(ResponseType::Error),
            other => Err(format!("unknown response type: {other}")),
        }
    }
}

/// A response, live from the network or materialized from a store.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    /// Header names are lowercased.
    pub headers: BTreeMap<String, String>,
    pub response_type: ResponseType,
    pub url: Option<Url>,
    pub body: Body,
}

impl Response {
    pub fn new(status: u16, response_type: ResponseType, body: impl Into<Body>) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers: BTreeMap::new(),
            response_type,
            url: None,
            body: body.into(),
        }
    }

    /// A cross-origin response with status and body hidden.
    pub fn opaque() -> Self {
        Self::new(0, ResponseType::Opaque, Body::empty())
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Produce an independent copy whose body can be consumed separately.
    pub fn duplicate(&self) -> Result<Response, BodyError> {
        Ok(Response {
            status: self.status,
            status_text: self.status_text.clone(),
            headers: self.headers.clone(),
            response_type: self.response_type,
            url: self.url.clone(),
            body: self.body.tee()?,
        })
    }

    /// Consume the response body as lossy UTF-8 text.
    pub fn text(&mut self) -> Result<String, BodyError> {
        let bytes = self.body.take()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
