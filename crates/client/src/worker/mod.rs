//! The offline worker.
//!
//! One [`Worker`] serves one cache generation, named by its [`Version`]. It
//! answers the four lifecycle events:
//!
//! - **install**: prefetch the configured resources into the current store,
//!   all or nothing ([`install`])
//! - **activate**: delete every store that is not the current generation
//!   ([`reap`])
//! - **fetch**: cache first, then network with write-back, then the fallback
//!   document for navigations ([`intercept`])
//! - **sync**: post a timestamp to the sync endpoint ([`sync`])
//!
//! The [`host`] module sequences these events and owns the "wait until"
//! contract for work that outlives a response.

pub mod error;
pub mod host;
pub mod install;
pub mod intercept;
pub mod lifetime;
pub mod reap;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use haven_core::{AppConfig, CacheDb, Error, Request, Store, URLS_TO_CACHE, Version};
use url::Url;

use crate::fetch::{Network, resolve};

pub use error::{CacheWriteError, InstallError, SyncDispatchError};
pub use host::{Dispatched, Host, ServiceWorker, WorkerState};
pub use intercept::{Handled, ResponseSource, is_cacheable};
pub use lifetime::Lifetime;
pub use reap::ReapReport;
pub use sync::SyncPayload;

/// Settings a worker is built with. Fixed for the worker's lifetime.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub version: Version,
    pub origin: Url,
    /// Resources stored on install, absolute or root-relative.
    pub prefetch: Vec<String>,
    /// Document served to offline navigations.
    pub fallback_url: Url,
    pub sync_tag: String,
    pub sync_url: Url,
}

impl WorkerConfig {
    /// Build the settings for the compiled-in generation, taking the origin
    /// and endpoint paths from `config`.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = config
            .origin_url()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        let fallback_url =
            resolve(&origin, &config.fallback_path).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let sync_url = resolve(&origin, &config.sync_endpoint).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        Ok(Self {
            version: Version::default(),
            origin,
            prefetch: URLS_TO_CACHE.iter().map(|s| s.to_string()).collect(),
            fallback_url,
            sync_tag: config.sync_tag.clone(),
            sync_url,
        })
    }
}

/// The offline worker for one generation.
pub struct Worker {
    config: WorkerConfig,
    db: CacheDb,
    network: Arc<dyn Network>,
}

impl Worker {
    pub fn new(config: WorkerConfig, db: CacheDb, network: Arc<dyn Network>) -> Self {
        Self { config, db, network }
    }

    /// The store scoped to the current generation.
    pub fn store(&self) -> Store {
        self.db.open_store(self.config.version.as_str())
    }
}

#[async_trait]
impl ServiceWorker for Worker {
    async fn install(&self) -> Result<(), InstallError> {
        self.prefetch(&self.config.prefetch).await.map(|_| ())
    }

    async fn activate(&self) -> Result<ReapReport, Error> {
        self.reap().await
    }

    async fn fetch(&self, request: Request) -> Result<Handled, Error> {
        self.handle(request).await
    }

    async fn sync(&self, tag: &str) -> Result<bool, SyncDispatchError> {
        self.dispatch_sync(tag).await
    }
}
