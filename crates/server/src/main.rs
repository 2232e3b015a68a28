//! haven server entry point.
//!
//! This is the main binary that registers the offline worker, runs its install
//! and activate events, and then exposes it over the MCP stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use haven_client::{FetchClient, FetchConfig, Host, Network, Worker, WorkerConfig};
use haven_core::{AppConfig, CACHE_NAME, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = CACHE_NAME, db = %config.db_path.display(), "Starting haven server on stdio transport");

    let cache = CacheDb::open(&config.db_path).await?;
    let network: Arc<dyn Network> = Arc::new(FetchClient::new(FetchConfig::from_app(&config)?)?);
    let worker_config = WorkerConfig::from_app(&config)?;

    let worker = Arc::new(Worker::new(worker_config.clone(), cache.clone(), network.clone()));
    let host = Arc::new(Host::new(worker, network));

    if let Err(e) = host.start().await {
        tracing::error!(error = %e, "worker did not start; requests pass through until installed");
    }

    let handler = handler::HavenServer::new(host.clone(), cache, worker_config);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    host.drain().await;

    Ok(())
}
