//! Values exchanged with callers: documents and addresses.
//!
//! # Design
//! `Document::body` holds the raw JSON bytes exactly as the store returned
//! them. The client never deserializes a caller's document, so the caller's
//! schema stays untouched; `Document::json` is a convenience for callers that
//! want a typed view.

use serde::de::DeserializeOwned;

/// A document id plus its raw JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub body: Vec<u8>,
}

impl Document {
    pub fn new(id: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
        }
    }

    /// Deserialize the body into a caller-defined type.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

/// Hierarchical location of a request: index, then optional type, id and
/// operation suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address<'a> {
    pub index: &'a str,
    pub doc_type: Option<&'a str>,
    pub id: Option<&'a str>,
    pub suffix: Option<&'a str>,
}

impl<'a> Address<'a> {
    pub fn new(index: &'a str) -> Self {
        Self {
            index,
            doc_type: None,
            id: None,
            suffix: None,
        }
    }

    pub fn doc_type(mut self, doc_type: &'a str) -> Self {
        self.doc_type = Some(doc_type);
        self
    }

    pub fn id(mut self, id: &'a str) -> Self {
        self.id = Some(id);
        self
    }

    pub fn suffix(mut self, suffix: &'a str) -> Self {
        self.suffix = Some(suffix);
        self
    }

    /// Path variables in the order the default template declares them.
    pub fn path_vars(&self) -> [(&'static str, Option<&'a str>); 4] {
        [
            ("index", Some(self.index)),
            ("type", self.doc_type),
            ("id", self.id),
            ("suffix", self.suffix),
        ]
    }
}
