//! Request/response value types shared by the store, the network and the worker.
//!
//! Bodies are single-read. Both [`Request`] and [`Response`] expose an explicit
//! `duplicate` that yields two independently readable instances; the worker
//! uses it wherever one payload has to reach two consumers (network and store
//! key, store and caller).

pub mod body;
pub mod request;
pub mod response;

pub use body::{Body, BodyError};
pub use request::{Request, RequestMode};
pub use response::{Response, ResponseType};
