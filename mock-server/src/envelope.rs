//! Wire shapes returned by the mock, one per operation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::StoredDocument;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shards {
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
}

impl Shards {
    /// The mock is a single shard with no replicas.
    pub fn single() -> Self {
        Self {
            total: 1,
            successful: 1,
            failed: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexResponse {
    #[serde(rename = "_shards")]
    pub shards: Shards,
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version")]
    pub version: u64,
    pub created: bool,
    pub result: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetResponse {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version", skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    pub found: bool,
    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score")]
    pub score: f64,
    #[serde(rename = "_source")]
    pub source: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchHits {
    pub total: usize,
    pub max_score: Option<f64>,
    pub hits: Vec<SearchHit>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub took: u64,
    pub timed_out: bool,
    #[serde(rename = "_shards")]
    pub shards: Shards,
    pub hits: SearchHits,
}

impl SearchResponse {
    /// Every match scores 1.0; the mock does exact matching only.
    pub fn new(index: &str, took: u64, docs: Vec<&StoredDocument>) -> Self {
        let hits: Vec<SearchHit> = docs
            .into_iter()
            .map(|doc| SearchHit {
                index: index.to_string(),
                doc_type: doc.doc_type.clone(),
                id: doc.id.clone(),
                score: 1.0,
                source: doc.body.clone(),
            })
            .collect();
        Self {
            took,
            timed_out: false,
            shards: Shards::single(),
            hits: SearchHits {
                total: hits.len(),
                max_score: if hits.is_empty() { None } else { Some(1.0) },
                hits,
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteIndexResponse {
    pub acknowledged: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(rename = "_shards")]
    pub shards: Shards,
    pub found: bool,
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version")]
    pub version: u64,
    pub result: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    #[serde(rename = "_shards")]
    pub shards: Shards,
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version")]
    pub version: u64,
    pub result: String,
    pub created: bool,
}

/// One bulk entry, tagged by the action that produced it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkItem {
    Index(BulkItemResult),
    Create(BulkItemResult),
    Update(BulkItemResult),
    Delete(BulkItemResult),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BulkItemResult {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version", skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BulkResponse {
    pub took: u64,
    pub errors: bool,
    pub items: Vec<BulkItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCause {
    #[serde(rename = "type")]
    pub kind: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub root_cause: Vec<RootCause>,
    #[serde(rename = "type")]
    pub kind: String,
    pub reason: String,
}

impl ErrorDetail {
    pub fn new(kind: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            root_cause: vec![RootCause {
                kind: kind.to_string(),
                reason: reason.clone(),
            }],
            kind: kind.to_string(),
            reason,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub status: u16,
}

impl ErrorResponse {
    pub fn new(kind: &str, reason: impl Into<String>, status: u16) -> Self {
        Self {
            error: ErrorDetail::new(kind, reason),
            status,
        }
    }
}
