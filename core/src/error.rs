//! Error types for the document-store client.
//!
//! # Design
//! The store reports most logical failures as ordinary boolean fields inside a
//! 2xx response (`created`, `found`, `acknowledged`). Those are turned into
//! `Error::State` at the decode boundary so nothing above the decoder ever
//! re-inspects raw flags. Non-2xx responses land in `Error::Server` with the
//! reason extracted from the error envelope; the status code is not kept.
//!
//! Bulk requests can fail per item. `PartialBulkFailure` carries every id the
//! response reported, in submission order, so callers can reconcile.

/// Errors returned by every client operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP exchange itself failed (DNS, connection refused, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    /// The server answered with a status `>= 299`.
    #[error("server error: {reason}")]
    Server { reason: String },

    /// The response payload is not valid JSON for the expected envelope.
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// A bulk metadata line or update payload could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// The payload decoded, but the operation-specific flag says it failed.
    #[error(transparent)]
    State(#[from] StateError),

    /// The URI template could not be parsed.
    #[error("malformed URI template: {0}")]
    MalformedTemplate(String),

    /// The configured base URL is not an absolute http(s) URL.
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    /// One or more bulk items failed. `ids` holds every item's id by position;
    /// `failed` holds the positions that failed.
    #[error("{} of {} bulk items failed", failed.len(), ids.len())]
    PartialBulkFailure { ids: Vec<String>, failed: Vec<usize> },
}

/// Operation-specific invariants that a well-formed response can still violate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("failed to create document")]
    NotCreated,

    #[error("document {id:?} was not found")]
    NotFound { id: String },

    #[error("index drop was not acknowledged")]
    NotAcknowledged,

    /// An update created the document instead of replacing it.
    #[error("accidentally upserted document {id:?}")]
    Upserted { id: String },

    #[error("response reported success without a document id")]
    MissingId,
}

impl Error {
    /// Ids returned alongside a partial bulk failure, if this is one.
    pub fn bulk_ids(&self) -> Option<&[String]> {
        match self {
            Error::PartialBulkFailure { ids, .. } => Some(ids),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
