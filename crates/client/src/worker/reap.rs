//! Generation reaper.
//!
//! Runs once per activation: every store whose name is not exactly the
//! current version is deleted. Running it again is a no-op.

use futures::future::join_all;
use haven_core::Error;
use serde::{Deserialize, Serialize};

use super::Worker;

/// What an activation did to the stored generations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReapReport {
    /// The current generation, if it has a store.
    pub kept: Option<String>,
    pub deleted: Vec<String>,
}

impl Worker {
    /// Delete every stored generation except the current one.
    ///
    /// All deletions are attempted even if one fails.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    pub async fn reap(&self) -> Result<ReapReport, Error> {
        let version = &self.config.version;
        let names = self.db.store_names().await?;

        let (current, stale): (Vec<String>, Vec<String>) = names.into_iter().partition(|name| version.is_current(name));

        let results = join_all(stale.iter().map(|name| self.db.delete_store(name))).await;

        let mut report = ReapReport { kept: current.into_iter().next(), deleted: Vec::new() };
        let mut first_error = None;

        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(_) => {
                    tracing::info!(store = %name, current = %version, "deleted stale generation");
                    report.deleted.push(name);
                }
                Err(e) => {
                    tracing::warn!(store = %name, error = %e, "failed to delete stale generation");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}
