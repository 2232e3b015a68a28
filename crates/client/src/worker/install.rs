//! Prefetch loader.
//!
//! Runs once per installation. Every resource is fetched first; only when all of
//! them answered with a 2xx status are they written, in a single transaction,
//! to the current generation's store. A failed install leaves no new store
//! behind and never touches another generation.

use futures::future::try_join_all;
use haven_core::Request;

use super::Worker;
use super::error::InstallError;
use crate::fetch::resolve;

impl Worker {
    /// Fetch and store every resource in `resources`.
    ///
    /// Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// - `InstallError::EmptyList` if `resources` is empty
    /// - `InstallError::FetchFailed` for the first resource that is invalid,
    ///   unreachable or not 2xx
    /// - `InstallError::StoreFailed` if the store transaction fails
    pub async fn prefetch(&self, resources: &[String]) -> Result<usize, InstallError> {
        if resources.is_empty() {
            return Err(InstallError::EmptyList);
        }

        let fetches = resources.iter().map(|resource| async move {
            let url = resolve(&self.config.origin, resource)
                .map_err(|e| InstallError::FetchFailed { resource: resource.clone(), reason: e.to_string() })?;
            let key = Request::get(url);
            let attempt = key
                .duplicate()
                .map_err(|e| InstallError::FetchFailed { resource: resource.clone(), reason: e.to_string() })?;

            let response = self
                .network
                .fetch(attempt)
                .await
                .map_err(|e| InstallError::FetchFailed { resource: resource.clone(), reason: e.to_string() })?;

            if !response.is_ok() {
                return Err(InstallError::FetchFailed {
                    resource: resource.clone(),
                    reason: format!("status {}", response.status),
                });
            }

            Ok((key, response))
        });

        let entries = try_join_all(fetches).await.inspect_err(|e| {
            tracing::warn!(version = %self.config.version, error = %e, "install aborted");
        })?;

        let count = entries.len();
        self.store()
            .put_many(entries)
            .await
            .map_err(|e| InstallError::StoreFailed(e.to_string()))?;

        tracing::info!(version = %self.config.version, entries = count, "installed generation");

        Ok(count)
    }
}
