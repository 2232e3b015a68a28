//! Interception engine.
//!
//! ### Algorithm
//! 1. Look the request up in the current generation's store. A hit is returned
//!    as is; the network is never touched.
//! 2. On a miss, send an independent copy of the request to the network.
//! 3. A `200` same-origin (`basic`) response to a `GET` is duplicated: one copy is written
//!    back to the store by a background task attached to the event's
//!    [`Lifetime`], the other goes to the caller without waiting on the write.
//!    Anything else is returned uncached.
//! 4. If the network yields no response, navigations get the stored fallback
//!    document; every other request gets no response.
//!
//! Write-backs are attempted once. Failures are logged and dropped.

use std::fmt;

use haven_core::{Error, Request, Response, ResponseType};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use super::Worker;
use super::error::CacheWriteError;
use super::lifetime::Lifetime;

/// Where an intercepted request's answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
    Fallback,
    /// No response; the caller falls back to its own error handling.
    None,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
            ResponseSource::Fallback => "fallback",
            ResponseSource::None => "none",
        }
    }
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one interception.
#[derive(Debug)]
pub struct Handled {
    pub response: Option<Response>,
    pub source: ResponseSource,
    /// Work the host must await before the event is done.
    pub lifetime: Lifetime,
}

impl Handled {
    fn new(response: Option<Response>, source: ResponseSource) -> Self {
        Self { response, source, lifetime: Lifetime::new() }
    }
}

/// Whether a network response may be written back.
pub fn is_cacheable(response: &Response) -> bool {
    response.status == 200 && response.response_type == ResponseType::Basic
}

impl Worker {
    /// Resolve `request` cache-first.
    ///
    /// # Errors
    ///
    /// Returns `Error::Body` if the request body was already consumed and
    /// cannot be copied for the network attempt.
    pub async fn handle(&self, request: Request) -> Result<Handled, Error> {
        let store = self.store();

        match store.get(&request).await {
            Ok(Some(response)) => {
                tracing::debug!(url = %request.url, version = %self.config.version, "cache hit");
                return Ok(Handled::new(Some(response), ResponseSource::Cache));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed; treating as miss"),
        }

        let attempt = request.duplicate()?;

        match self.network.fetch(attempt).await {
            Ok(response) => {
                let mut handled = Handled::new(None, ResponseSource::Network);

                if request.method == "GET" && is_cacheable(&response) {
                    match response.duplicate() {
                        Ok(copy) => handled.lifetime.wait_until(self.write_back(request, copy)),
                        Err(e) => {
                            let err = CacheWriteError::from(e);
                            tracing::warn!(error = %err, "skipped cache write");
                        }
                    }
                } else {
                    tracing::debug!(
                        url = %request.url,
                        status = response.status,
                        response_type = %response.response_type,
                        "response not cacheable"
                    );
                }

                handled.response = Some(response);
                Ok(handled)
            }
            Err(err) => {
                tracing::debug!(url = %request.url, mode = %request.mode, error = %err, "network unavailable");

                if !request.is_navigation() {
                    return Ok(Handled::new(None, ResponseSource::None));
                }

                match store.get_url(&self.config.fallback_url).await {
                    Ok(Some(fallback)) => {
                        tracing::debug!(url = %request.url, "serving fallback document");
                        Ok(Handled::new(Some(fallback), ResponseSource::Fallback))
                    }
                    Ok(None) => Ok(Handled::new(None, ResponseSource::None)),
                    Err(e) => {
                        tracing::warn!(error = %e, "fallback lookup failed");
                        Ok(Handled::new(None, ResponseSource::None))
                    }
                }
            }
        }
    }

    /// Store `response` under `request` in the background.
    fn write_back(&self, request: Request, response: Response) -> JoinHandle<()> {
        let store = self.store();
        tokio::spawn(async move {
            match store.put(&request, response).await {
                Ok(()) => tracing::debug!(url = %request.url, store = store.name(), "cached response"),
                Err(e) => {
                    let err = CacheWriteError::from(e);
                    tracing::warn!(url = %request.url, error = %err, "dropped cache write");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{absolute, worker};
    use super::*;
    use haven_core::RequestMode;

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let (worker, network, _db) = worker("v1", &[]).await;
        worker.store().put(&Request::get(absolute("/app.js")), Response::new(200, ResponseType::Basic, "cached")).await.unwrap();

        let mut handled = worker.handle(Request::get(absolute("/app.js"))).await.unwrap();

        assert_eq!(handled.source, ResponseSource::Cache);
        assert_eq!(handled.response.as_mut().unwrap().text().unwrap(), "cached");
        assert!(handled.lifetime.is_empty());
        assert_eq!(network.calls(), 0);
    }

    #[tokio::test]
    async fn test_miss_writes_back_and_serves_offline() {
        let (worker, network, _db) = worker("v1", &[]).await;
        network.ok("/data.json", "{\"n\":1}");

        let mut first = worker.handle(Request::get(absolute("/data.json"))).await.unwrap();
        assert_eq!(first.source, ResponseSource::Network);
        assert_eq!(first.lifetime.pending(), 1);
        assert_eq!(first.response.as_mut().unwrap().text().unwrap(), "{\"n\":1}");
        first.lifetime.settled().await;

        network.set_offline(true);
        let mut second = worker.handle(Request::get(absolute("/data.json"))).await.unwrap();

        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.response.as_mut().unwrap().text().unwrap(), "{\"n\":1}");
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test]
    async fn test_network_gets_copy_of_request() {
        let (worker, network, _db) = worker("v1", &[]).await;
        network.ok("/page", "page");

        let request = Request::get(absolute("/page#frag")).with_header("Accept", "text/html");
        let handled = worker.handle(request).await.unwrap();
        handled.lifetime.settled().await;

        let sent = network.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].headers, vec![("accept".to_string(), "text/html".to_string())]);
        assert!(worker.store().get_url(&absolute("/page")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_error_status_not_cached() {
        let (worker, network, db) = worker("v1", &[]).await;
        network.route("/missing", 404, ResponseType::Basic, "not found");

        let handled = worker.handle(Request::get(absolute("/missing"))).await.unwrap();

        assert_eq!(handled.response.as_ref().unwrap().status, 404);
        assert!(handled.lifetime.is_empty());
        assert!(!db.has_store("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_non_200_success_not_cached() {
        let (worker, network, db) = worker("v1", &[]).await;
        network.route("/empty", 204, ResponseType::Basic, "");

        let handled = worker.handle(Request::get(absolute("/empty"))).await.unwrap();

        assert_eq!(handled.response.as_ref().unwrap().status, 204);
        assert!(handled.lifetime.is_empty());
        assert!(!db.has_store("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_cross_origin_not_cached() {
        let (worker, network, db) = worker("v1", &[]).await;
        network.route("https://cdn.test/font.woff", 200, ResponseType::Cors, "font");
        network.route("https://cdn.test/pixel.gif", 200, ResponseType::Opaque, "");

        let cors = worker.handle(Request::get(url::Url::parse("https://cdn.test/font.woff").unwrap())).await.unwrap();
        let opaque = worker
            .handle(Request::get(url::Url::parse("https://cdn.test/pixel.gif").unwrap()).with_mode(RequestMode::NoCors))
            .await
            .unwrap();

        assert_eq!(cors.response.as_ref().unwrap().response_type, ResponseType::Cors);
        assert_eq!(opaque.response.as_ref().unwrap().response_type, ResponseType::Opaque);
        assert!(cors.lifetime.is_empty());
        assert!(opaque.lifetime.is_empty());
        assert!(!db.has_store("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_navigation_fallback_when_offline() {
        let (worker, network, _db) = worker("v1", &[]).await;
        worker.store().put(&Request::get(absolute("/")), Response::new(200, ResponseType::Basic, "offline home")).await.unwrap();
        network.set_offline(true);

        let mut handled = worker.handle(Request::navigate(absolute("/dashboard"))).await.unwrap();

        assert_eq!(handled.source, ResponseSource::Fallback);
        assert_eq!(handled.response.as_mut().unwrap().text().unwrap(), "offline home");
    }

    #[tokio::test]
    async fn test_navigation_without_fallback_is_empty() {
        let (worker, network, _db) = worker("v1", &[]).await;
        network.set_offline(true);

        let handled = worker.handle(Request::navigate(absolute("/dashboard"))).await.unwrap();

        assert_eq!(handled.source, ResponseSource::None);
        assert!(handled.response.is_none());
    }

    #[tokio::test]
    async fn test_subresource_failure_has_no_response() {
        let (worker, network, _db) = worker("v1", &[]).await;
        worker.store().put(&Request::get(absolute("/")), Response::new(200, ResponseType::Basic, "home")).await.unwrap();
        network.set_offline(true);

        let handled = worker.handle(Request::get(absolute("/img/logo.png"))).await.unwrap();

        assert_eq!(handled.source, ResponseSource::None);
        assert!(handled.response.is_none());
    }

    #[tokio::test]
    async fn test_lookup_only_searches_current_generation() {
        let (worker, network, db) = worker("v2", &[]).await;
        db.open_store("v1").put(&Request::get(absolute("/old.css")), Response::new(200, ResponseType::Basic, "stale")).await.unwrap();
        network.set_offline(true);

        let handled = worker.handle(Request::get(absolute("/old.css"))).await.unwrap();

        assert!(handled.response.is_none());
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test]
    async fn test_post_passes_through_uncached() {
        let (worker, network, db) = worker("v1", &[]).await;
        network.ok("/api/logs/", "{\"success\":true}");

        let request = Request::new("POST", absolute("/api/logs/"), RequestMode::Cors).with_body("[]");
        let handled = worker.handle(request).await.unwrap();

        assert_eq!(handled.response.as_ref().unwrap().status, 200);
        assert!(handled.lifetime.is_empty());
        assert_eq!(network.requests()[0].body.as_ref(), b"[]");
        assert!(!db.has_store("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_consumed_request_body_is_an_error() {
        let (worker, network, _db) = worker("v1", &[]).await;
        let mut request = Request::new("POST", absolute("/api"), RequestMode::Cors).with_body("x");
        request.body.take().unwrap();

        assert!(matches!(worker.handle(request).await, Err(Error::Body(_))));
        assert_eq!(network.calls(), 0);
    }

    #[test]
    fn test_is_cacheable() {
        assert!(is_cacheable(&Response::new(200, ResponseType::Basic, "")));
        assert!(!is_cacheable(&Response::new(200, ResponseType::Cors, "")));
        assert!(!is_cacheable(&Response::new(301, ResponseType::Basic, "")));
        assert!(!is_cacheable(&Response::opaque()));
    }
}
