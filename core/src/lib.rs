//! Client for a document store's REST/JSON protocol.
//!
//! # Overview
//! Addresses documents by index, type and id; inserts, fetches, updates and
//! deletes them one at a time or in newline-delimited bulk batches; and runs
//! `field:value` searches. Works against a real store or the offline
//! `mock-server` crate.
//!
//! # Design
//! - `uri` expands a base template with optional path segments.
//! - `http` holds plain-data requests and the single/bulk request codec.
//! - `transport` performs the blocking round trip; statuses `>= 299` become
//!   `Error::Server`.
//! - `decode` maps response envelopes to typed results, turning the store's
//!   boolean flags into `Error::State` at the boundary.
//! - `Rest` ties these together per operation; `Client`/`Index`/`Type` are
//!   thin handles over it.
//! - Nothing is retried. Every failure is returned to the caller once.

pub mod bulk;
pub mod client;
pub mod decode;
pub mod error;
pub mod http;
pub mod options;
pub mod rest;
pub mod transport;
pub mod types;
pub mod uri;

pub use client::{Client, Index, Type};
pub use error::{Error, Result, StateError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use options::{Options, DEFAULT_URL};
pub use rest::Rest;
pub use transport::{Transport, UreqTransport};
pub use types::{Address, Document};
pub use uri::{build_uri, UriTemplate};
