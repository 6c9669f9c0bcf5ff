//! In-memory document store behind the mock routes.
//!
//! # Design
//! Documents are keyed by `(index, type, id)`. Indices are created implicitly
//! by the first write and removed as a whole by `drop_index`, so "index does
//! not exist" and "index has no matching documents" stay distinguishable for
//! searches. Every document records an insertion sequence number; search hits
//! come back in that order.
//!
//! `Store` itself is not synchronized. The HTTP layer wraps it in a single
//! `RwLock`, which serializes writers and lets a bulk batch apply in full
//! before anyone observes it.

use std::collections::HashMap;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::StoreError;
use crate::query::SearchQuery;

#[derive(Clone, Debug, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub doc_type: String,
    pub version: u64,
    pub body: Map<String, Value>,
    seq: u64,
}

/// Outcome of `Store::upsert`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Upserted {
    pub was_update: bool,
    pub version: u64,
}

type DocKey = (String, String);

#[derive(Debug, Default)]
struct IndexData {
    docs: HashMap<DocKey, StoredDocument>,
}

#[derive(Debug, Default)]
pub struct Store {
    indices: HashMap<String, IndexData>,
    next_seq: u64,
}

fn key(doc_type: &str, id: &str) -> DocKey {
    (doc_type.to_string(), id.to_string())
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    pub fn has_index(&self, index: &str) -> bool {
        self.indices.contains_key(index)
    }

    /// Store `body` under a fresh id.
    pub fn insert(&mut self, index: &str, doc_type: &str, body: Map<String, Value>) -> StoredDocument {
        let doc = StoredDocument {
            id: Uuid::new_v4().simple().to_string(),
            doc_type: doc_type.to_string(),
            version: 1,
            body,
            seq: self.next_seq(),
        };
        self.indices
            .entry(index.to_string())
            .or_default()
            .docs
            .insert(key(doc_type, &doc.id), doc.clone());
        doc
    }

    /// Create the document if absent, otherwise replace its body.
    pub fn upsert(&mut self, index: &str, doc_type: &str, id: &str, body: Map<String, Value>) -> Upserted {
        let seq = self.next_seq();
        let docs = &mut self.indices.entry(index.to_string()).or_default().docs;

        match docs.get_mut(&key(doc_type, id)) {
            Some(doc) => {
                doc.body = body;
                doc.version += 1;
                Upserted {
                    was_update: true,
                    version: doc.version,
                }
            }
            None => {
                let doc = StoredDocument {
                    id: id.to_string(),
                    doc_type: doc_type.to_string(),
                    version: 1,
                    body,
                    seq,
                };
                docs.insert(key(doc_type, id), doc);
                Upserted {
                    was_update: false,
                    version: 1,
                }
            }
        }
    }

    /// Overlay `partial`'s top-level fields onto an existing document.
    /// Returns the new version, or `None` if the document does not exist.
    pub fn merge(&mut self, index: &str, doc_type: &str, id: &str, partial: Map<String, Value>) -> Option<u64> {
        let doc = self.indices.get_mut(index)?.docs.get_mut(&key(doc_type, id))?;
        doc.body.extend(partial);
        doc.version += 1;
        Some(doc.version)
    }

    pub fn get(&self, index: &str, doc_type: &str, id: &str) -> Option<&StoredDocument> {
        self.indices.get(index)?.docs.get(&key(doc_type, id))
    }

    /// Remove a document. Returns the version recorded for the deletion, or
    /// `None` if nothing was there.
    pub fn delete(&mut self, index: &str, doc_type: &str, id: &str) -> Option<u64> {
        let doc = self.indices.get_mut(index)?.docs.remove(&key(doc_type, id))?;
        Some(doc.version + 1)
    }

    /// Remove the index and all its documents. Dropping a missing index is
    /// not an error; the return value says whether it existed.
    pub fn drop_index(&mut self, index: &str) -> bool {
        self.indices.remove(index).is_some()
    }

    pub fn search_index(&self, index: &str, query: &SearchQuery) -> Result<Vec<&StoredDocument>, StoreError> {
        self.search(index, None, query)
    }

    pub fn search_type(
        &self,
        index: &str,
        doc_type: &str,
        query: &SearchQuery,
    ) -> Result<Vec<&StoredDocument>, StoreError> {
        self.search(index, Some(doc_type), query)
    }

    fn search(
        &self,
        index: &str,
        doc_type: Option<&str>,
        query: &SearchQuery,
    ) -> Result<Vec<&StoredDocument>, StoreError> {
        let data = self
            .indices
            .get(index)
            .ok_or_else(|| StoreError::IndexNotFound(index.to_string()))?;

        let mut hits: Vec<&StoredDocument> = data
            .docs
            .values()
            .filter(|doc| doc_type.map_or(true, |t| doc.doc_type == t))
            .filter(|doc| query.matches(&doc.body))
            .collect();
        hits.sort_by_key(|doc| doc.seq);
        Ok(hits)
    }
}
