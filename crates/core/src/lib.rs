//! Core types and shared functionality for haven.
//!
//! This crate provides:
//! - Request/response value types with single-read bodies
//! - The version registry naming the current cache generation
//! - Generation stores with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod version;

pub use cache::{CacheDb, Store};
pub use config::AppConfig;
pub use error::Error;
pub use http::{Body, BodyError, Request, RequestMode, Response, ResponseType};
pub use version::{CACHE_NAME, URLS_TO_CACHE, Version};
