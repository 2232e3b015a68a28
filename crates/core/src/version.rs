//! Version registry: the identifier of the running cache generation.

use std::fmt;
use std::sync::Arc;

/// Generation compiled into this build.
pub const CACHE_NAME: &str = "haven-v1";

/// Resources stored on install, in order.
pub const URLS_TO_CACHE: &[&str] = &[
    "/",
    "/static/icons/icon-192x192.png",
    "/static/icons/icon-512x512.png",
    "/manifest.json",
    "https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.0.0/css/all.min.css",
    "https://cdn.jsdelivr.net/npm/chart.js",
];

/// Read-only name of the current generation.
///
/// Fixed when the worker is built; every store operation is scoped by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(Arc<str>);

impl Version {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a stored generation name is this one.
    pub fn is_current(&self, store_name: &str) -> bool {
        &*self.0 == store_name
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(CACHE_NAME)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
