//! Fixtures shared by the tool tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use haven_client::{Host, Network, NetworkError, Worker, WorkerConfig};
use haven_core::{CacheDb, Request, Response, ResponseType, Version};
use rmcp::model::CallToolResult;
use url::Url;

pub const ORIGIN: &str = "http://app.test";

/// Same-origin pages by path, with an offline switch.
#[derive(Default)]
pub struct Pages {
    pages: Mutex<HashMap<String, &'static str>>,
    offline: AtomicBool,
}

impl Pages {
    pub fn serve(&self, path: &str, body: &'static str) {
        self.pages.lock().unwrap().insert(path.to_string(), body);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl Network for Pages {
    async fn fetch(&self, request: Request) -> Result<Response, NetworkError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable("offline".into()));
        }
        let body = self.pages.lock().unwrap().get(request.url.path()).copied();
        match body {
            Some(body) => Ok(Response::new(200, ResponseType::Basic, body)
                .with_header("content-type", "text/html")
                .with_url(request.url)),
            None => Ok(Response::new(404, ResponseType::Basic, "not found").with_url(request.url)),
        }
    }
}

pub fn absolute(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

pub fn worker_config(version: &str) -> WorkerConfig {
    WorkerConfig {
        version: Version::new(version),
        origin: Url::parse(ORIGIN).unwrap(),
        prefetch: vec!["/".into()],
        fallback_url: absolute("/"),
        sync_tag: "background-sync".into(),
        sync_url: absolute("/api/sync-offline-data"),
    }
}

/// A host for `version` whose network serves `/` and the sync endpoint.
pub async fn host(version: &str) -> (Arc<Host>, Arc<Pages>, CacheDb, WorkerConfig) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let pages = Arc::new(Pages::default());
    pages.serve("/", "<h1>home</h1>");
    pages.serve("/api/sync-offline-data", "");

    let config = worker_config(version);
    let worker = Arc::new(Worker::new(config.clone(), db.clone(), pages.clone()));
    let host = Arc::new(Host::new(worker, pages.clone()));
    (host, pages, db, config)
}

/// Parse the JSON text content of a tool result.
pub fn output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
