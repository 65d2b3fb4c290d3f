//! Synchronous client object model for the any.do task service.
//!
//! # Overview
//! Log in with [`Client`], fetch the authenticated [`User`], then work with
//! its tasks, categories and pending shares as local objects. Every resource
//! wraps the server's JSON in a dirty-tracking [`Record`]; `save()` pushes
//! only when something actually changed.
//!
//! # Design
//! - Requests and responses are plain data ([`HttpRequest`],
//!   [`HttpResponse`]); the network round-trip sits behind the [`Transport`]
//!   trait, with [`UreqTransport`] as the blocking default.
//! - Every failure maps to one [`ApiError`] kind; nothing is retried.
//! - Collections are fetched lazily, cached per owner and refreshed only on
//!   request. Filtering happens locally over the cache.
//! - Single-threaded: resources share one `Rc<Session>`.

pub mod category;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod pending;
pub mod record;
pub mod resource;
pub mod session;
pub mod task;
pub mod transport;
pub mod user;

#[cfg(test)]
mod test_support;

pub use category::Category;
pub use client::Client;
pub use collection::{CacheState, Collection};
pub use config::{ClientConfig, Endpoints};
pub use error::{classify, ApiError, ErrorKind, Result, TransportError};
pub use filter::{CategoryQuery, RecordFilter, TaskQuery};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use pending::PendingShare;
pub use record::Record;
pub use resource::Resource;
pub use session::{Credentials, Session};
pub use task::Task;
pub use transport::UreqTransport;
pub use user::{NewUser, User};
