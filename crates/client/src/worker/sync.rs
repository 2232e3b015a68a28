//! Background sync trigger.
//!
//! A sync signal carrying the configured tag posts `{"timestamp": <ms>}` to the
//! sync endpoint once. Redelivery on failure is the host's job.

use haven_core::{Request, RequestMode};
use serde::{Deserialize, Serialize};

use super::Worker;
use super::error::SyncDispatchError;

/// Body of the sync request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPayload {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl SyncPayload {
    pub fn now() -> Self {
        Self { timestamp: chrono::Utc::now().timestamp_millis() }
    }
}

impl Worker {
    /// Handle a sync signal.
    ///
    /// Returns `Ok(false)` for tags this worker does not recognize. The
    /// endpoint's response is not inspected.
    pub async fn dispatch_sync(&self, tag: &str) -> Result<bool, SyncDispatchError> {
        if tag != self.config.sync_tag {
            tracing::debug!(tag, "ignoring unrecognized sync tag");
            return Ok(false);
        }

        let payload = SyncPayload::now();
        let body = serde_json::to_vec(&payload).map_err(|e| SyncDispatchError::Encode(e.to_string()))?;

        let request = Request::new("POST", self.config.sync_url.clone(), RequestMode::SameOrigin)
            .with_header("content-type", "application/json")
            .with_body(body);

        let response = self.network.fetch(request).await?;

        tracing::info!(tag, timestamp = payload.timestamp, status = response.status, "dispatched offline sync");

        Ok(true)
    }
}
