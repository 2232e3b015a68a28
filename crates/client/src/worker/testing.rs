//! In-test network and worker fixtures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use haven_core::{CacheDb, Request, RequestMode, Response, ResponseType, Version};
use url::Url;

use super::{Worker, WorkerConfig};
use crate::fetch::{Network, NetworkError};

pub const ORIGIN: &str = "http://app.test";

#[derive(Debug, Clone)]
struct Route {
    status: u16,
    response_type: ResponseType,
    body: &'static str,
}

/// An outgoing request as the network saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Scripted network with a call counter and an offline switch.
#[derive(Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<String, Route>>,
    offline: AtomicBool,
    calls: AtomicUsize,
    log: Mutex<Vec<Recorded>>,
}

impl MockNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `url` (absolute, or relative to [`ORIGIN`]) with a response.
    pub fn route(&self, url: &str, status: u16, response_type: ResponseType, body: &'static str) {
        let url = absolute(url).to_string();
        self.routes
            .lock()
            .unwrap()
            .insert(url, Route { status, response_type, body });
    }

    /// Same-origin 200 response.
    pub fn ok(&self, url: &str, body: &'static str) {
        self.route(url, 200, ResponseType::Basic, body);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, mut request: Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = request.body.take().unwrap_or_default();
        self.log.lock().unwrap().push(Recorded {
            method: request.method.clone(),
            url: request.url.to_string(),
            mode: request.mode,
            headers: request.headers.clone().into_iter().collect(),
            body,
        });

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable("offline".into()));
        }

        let mut key = request.url.clone();
        key.set_fragment(None);
        let route = self.routes.lock().unwrap().get(key.as_str()).cloned();
        let Some(route) = route else {
            return Err(NetworkError::Unreachable(format!("no route to {}", request.url)));
        };

        if route.response_type == ResponseType::Opaque {
            return Ok(Response::opaque());
        }

        Ok(Response::new(route.status, route.response_type, route.body)
            .with_header("content-type", "text/plain")
            .with_url(request.url))
    }
}

pub fn absolute(url: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(url).unwrap()
}

pub fn config(version: &str, prefetch: &[&str]) -> WorkerConfig {
    WorkerConfig {
        version: Version::new(version),
        origin: Url::parse(ORIGIN).unwrap(),
        prefetch: prefetch.iter().map(|s| s.to_string()).collect(),
        fallback_url: absolute("/"),
        sync_tag: "background-sync".into(),
        sync_url: absolute("/api/sync-offline-data"),
    }
}

/// A worker for `version` over a fresh in-memory database.
pub async fn worker(version: &str, prefetch: &[&str]) -> (Worker, Arc<MockNetwork>, CacheDb) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let network = MockNetwork::new();
    let worker = Worker::new(config(version, prefetch), db.clone(), network.clone());
    (worker, network, db)
}
