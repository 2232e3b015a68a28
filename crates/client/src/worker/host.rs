//! Lifecycle host.
//!
//! The host owns the worker's lifecycle and is the only thing that calls its
//! handlers. The handler object is passed in explicitly at construction.
//!
//! ### Ordering
//! - install must succeed before activate is allowed
//! - activate holds an exclusive gate while the reaper runs; controlled fetch
//!   dispatch holds the shared side, so no request resolves against a
//!   generation that is being cleaned up
//! - before activation starts, requests go straight to the network
//!
//! ### Lifetimes
//! A fetch answer is returned as soon as the handler produces it. The event's
//! [`Lifetime`] is parked in a task set; [`Host::drain`] awaits all of them.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use haven_core::{Error, Request, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;

use super::error::{InstallError, SyncDispatchError};
use super::intercept::{Handled, ResponseSource};
use super::reap::ReapReport;
use crate::fetch::Network;

/// Typed lifecycle handlers.
#[async_trait]
pub trait ServiceWorker: Send + Sync {
    /// Prepare the generation. Failure leaves the worker uninstalled.
    async fn install(&self) -> Result<(), InstallError>;

    /// Take over from prior generations.
    async fn activate(&self) -> Result<ReapReport, Error>;

    /// Answer an intercepted request.
    async fn fetch(&self, request: Request) -> Result<Handled, Error>;

    /// Handle a background sync signal. Returns whether the tag was recognized.
    async fn sync(&self, tag: &str) -> Result<bool, SyncDispatchError>;
}

/// Lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; may be retried.
    Redundant,
}

impl WorkerState {
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }

    pub fn can_install(&self) -> bool {
        matches!(self, WorkerState::Parsed | WorkerState::Redundant)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// The caller-visible result of a dispatched fetch.
#[derive(Debug)]
pub struct Dispatched {
    pub response: Option<Response>,
    pub source: ResponseSource,
}

/// Drives one worker through install → activate → intercept.
pub struct Host {
    worker: Arc<dyn ServiceWorker>,
    network: Arc<dyn Network>,
    state: Mutex<WorkerState>,
    gate: RwLock<()>,
    in_flight: Mutex<JoinSet<()>>,
}

impl Host {
    /// Register `worker` with a host that passes uncontrolled requests to `network`.
    pub fn new(worker: Arc<dyn ServiceWorker>, network: Arc<dyn Network>) -> Self {
        Self {
            worker,
            network,
            state: Mutex::new(WorkerState::Parsed),
            gate: RwLock::new(()),
            in_flight: Mutex::new(JoinSet::new()),
        }
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.lock().await
    }

    /// Run the install event.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` unless the worker is parsed or redundant
    /// - `Error::InstallFailed` if the handler fails; the worker becomes redundant
    pub async fn install(&self) -> Result<(), Error> {
        {
            let mut state = self.state.lock().await;
            if !state.can_install() {
                return Err(Error::InvalidState(format!("cannot install while {state}")));
            }
            *state = WorkerState::Installing;
        }

        let result = self.worker.install().await;

        let mut state = self.state.lock().await;
        match result {
            Ok(()) => {
                *state = WorkerState::Installed;
                tracing::info!("worker installed");
                Ok(())
            }
            Err(e) => {
                *state = WorkerState::Redundant;
                tracing::error!(error = %e, "worker install failed");
                Err(e.into())
            }
        }
    }

    /// Run the activate event.
    ///
    /// A failing reaper is logged; activation still completes. Returns the
    /// reaper's report when it succeeded.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless the worker is installed.
    pub async fn activate(&self) -> Result<Option<ReapReport>, Error> {
        {
            let mut state = self.state.lock().await;
            if *state != WorkerState::Installed {
                return Err(Error::InvalidState(format!("cannot activate while {state}")));
            }
            *state = WorkerState::Activating;
        }

        let _exclusive = self.gate.write().await;
        let report = match self.worker.activate().await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(error = %e, "activation cleanup failed");
                None
            }
        };

        *self.state.lock().await = WorkerState::Activated;
        tracing::info!("worker activated");

        Ok(report)
    }

    /// Install then activate.
    pub async fn start(&self) -> Result<Option<ReapReport>, Error> {
        self.install().await?;
        self.activate().await
    }

    /// Dispatch a fetch event.
    ///
    /// A request that arrives while activation is running waits for it and is
    /// then handled by the worker. Requests before that go to the network
    /// without touching the gate.
    ///
    /// # Errors
    ///
    /// Propagates handler errors (e.g. a request whose body was already read).
    pub async fn dispatch_fetch(&self, request: Request) -> Result<Dispatched, Error> {
        let controlled = match self.state().await {
            WorkerState::Activating | WorkerState::Activated => {
                let shared = self.gate.read().await;
                self.state().await.can_intercept_fetch().then_some(shared)
            }
            _ => None,
        };

        let Some(_shared) = controlled else {
            return Ok(self.pass_through(request).await);
        };

        let Handled { response, source, lifetime } = self.worker.fetch(request).await?;

        if !lifetime.is_empty() {
            let mut in_flight = self.in_flight.lock().await;
            while in_flight.try_join_next().is_some() {}
            in_flight.spawn(lifetime.settled());
        }

        Ok(Dispatched { response, source })
    }

    async fn pass_through(&self, request: Request) -> Dispatched {
        match self.network.fetch(request).await {
            Ok(response) => Dispatched { response: Some(response), source: ResponseSource::Network },
            Err(e) => {
                tracing::debug!(error = %e, "uncontrolled request failed");
                Dispatched { response: None, source: ResponseSource::None }
            }
        }
    }

    /// Dispatch a sync event.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` unless the worker is activated
    /// - `Error::SyncFailed` if the endpoint could not be reached
    pub async fn dispatch_sync(&self, tag: &str) -> Result<bool, Error> {
        if !self.state().await.can_intercept_fetch() {
            return Err(Error::InvalidState("sync requires an activated worker".into()));
        }
        Ok(self.worker.sync(tag).await?)
    }

    /// Wait for every event lifetime parked so far.
    ///
    /// Dispatch is not blocked while draining; lifetimes parked meanwhile are
    /// left for the next drain.
    pub async fn drain(&self) {
        let mut parked = std::mem::take(&mut *self.in_flight.lock().await);
        while let Some(result) = parked.join_next().await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "event lifetime did not complete");
            }
        }
    }
}
