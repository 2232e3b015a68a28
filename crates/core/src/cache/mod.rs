//! SQLite-backed generation stores.
//!
//! Every cache generation is a named store of request → response entries,
//! held in one database accessed through tokio-rusqlite:
//!
//! - Keys are SHA-256 over method and fragment-less URL
//! - Entries are replaced wholesale, never patched
//! - Deleting a store cascades to its entries
//! - Schema migrations run on open

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use store::{EntryMeta, Store, StoreInfo};
