//! Client code for haven.
//!
//! This crate provides the network side of the offline worker (the fetch
//! client) and the worker itself: prefetch, interception, generation cleanup,
//! background sync, and the lifecycle host that sequences them.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Network, NetworkError};

pub use worker::{
    Dispatched, Handled, Host, InstallError, Lifetime, ReapReport, ResponseSource, ServiceWorker, SyncDispatchError,
    SyncPayload, Worker, WorkerConfig, WorkerState,
};
