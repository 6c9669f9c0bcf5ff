//! Response decoding: raw payload bytes to typed results.
//!
//! # Design
//! Every response kind is read through one private `Envelope`, a superset of
//! all fields the store may send. Each `decode_*` function trusts only the
//! fields that matter for its operation and immediately turns the store's
//! boolean flags into `Ok(..)` or `Error::State`, so callers never see a raw
//! `created`/`found`/`acknowledged`.
//!
//! Flags are weakly typed on the wire. A flag may arrive as a JSON boolean or
//! as the string `"true"`/`"false"`; when `created` or `found` is missing the
//! `result` string (`"created"`, `"deleted"`) stands in for it. A missing flag
//! with no usable `result` counts as false.
//!
//! Malformed JSON is always `Error::Decode` with no partial result.

use serde::de::{self, Deserializer, Unexpected};
use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::{Error, Result, StateError};
use crate::types::Document;

// Superset of every response shape; each decoder reads its own subset.
#[allow(dead_code)]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Envelope {
    #[serde(rename = "_shards")]
    shards: Option<Shards>,
    #[serde(rename = "_index")]
    index: Option<String>,
    #[serde(rename = "_type")]
    doc_type: Option<String>,
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "_version")]
    version: Option<i64>,
    #[serde(deserialize_with = "flag")]
    created: Option<bool>,
    #[serde(deserialize_with = "flag")]
    found: Option<bool>,
    #[serde(deserialize_with = "flag")]
    acknowledged: Option<bool>,
    result: Option<String>,
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: Option<Box<RawValue>>,
    hits: Option<Hits>,
    error: Option<ErrorField>,
    #[serde(deserialize_with = "flag")]
    errors: Option<bool>,
    status: Option<u16>,
    items: Vec<BulkItem>,
}

#[allow(dead_code)]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Shards {
    total: u32,
    successful: u32,
    failed: u32,
}

#[allow(dead_code)]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Hits {
    total: Option<HitsTotal>,
    max_score: Option<f64>,
    hits: Vec<Hit>,
}

// Older stores send a bare count, newer ones `{"value": n, "relation": "eq"}`.
#[allow(dead_code)]
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HitsTotal {
    Count(u64),
    Object { value: u64 },
}

#[allow(dead_code)]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Hit {
    #[serde(rename = "_index")]
    index: Option<String>,
    #[serde(rename = "_type")]
    doc_type: Option<String>,
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: Option<Box<RawValue>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Detail(ErrorDetail),
    Message(String),
}

#[allow(dead_code)]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: Option<String>,
    reason: Option<String>,
    root_cause: Vec<RootCause>,
}

#[allow(dead_code)]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RootCause {
    #[serde(rename = "type")]
    kind: Option<String>,
    reason: Option<String>,
}

/// One entry of a bulk response, keyed by the action that produced it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BulkItem {
    index: Option<ItemEnvelope>,
    create: Option<ItemEnvelope>,
    update: Option<ItemEnvelope>,
    delete: Option<ItemEnvelope>,
}

#[allow(dead_code)]
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ItemEnvelope {
    #[serde(rename = "_index")]
    index: Option<String>,
    #[serde(rename = "_type")]
    doc_type: Option<String>,
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "_version")]
    version: Option<i64>,
    result: Option<String>,
    #[serde(deserialize_with = "flag")]
    created: Option<bool>,
    #[serde(deserialize_with = "flag")]
    found: Option<bool>,
    status: Option<u16>,
    error: Option<ErrorField>,
}

fn flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(value)) => Ok(Some(value)),
        Some(Flag::Text(text)) => match text.as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(de::Error::invalid_value(Unexpected::Str(other), &"a boolean")),
        },
    }
}

/// Explicit flag first, then the `result` string.
fn truthy(flag: Option<bool>, result: Option<&str>, expected: &str) -> bool {
    flag.unwrap_or_else(|| result == Some(expected))
}

fn envelope(bytes: &[u8]) -> Result<Envelope> {
    serde_json::from_slice(bytes).map_err(Error::Decode)
}

fn required_id(id: Option<String>) -> Result<String> {
    match id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(StateError::MissingId.into()),
    }
}

fn source_bytes(source: Option<Box<RawValue>>) -> Vec<u8> {
    source.map(|raw| raw.get().as_bytes().to_vec()).unwrap_or_default()
}

/// Insert response. The returned body is the full response payload.
pub fn decode_insert(bytes: &[u8]) -> Result<Document> {
    let env = envelope(bytes)?;
    if !truthy(env.created, env.result.as_deref(), "created") {
        return Err(StateError::NotCreated.into());
    }
    Ok(Document {
        id: required_id(env.id)?,
        body: bytes.to_vec(),
    })
}

/// Get-by-id response. The returned body is `_source`, verbatim.
pub fn decode_get(bytes: &[u8]) -> Result<Document> {
    let env = envelope(bytes)?;
    if env.found != Some(true) {
        return Err(StateError::NotFound {
            id: env.id.unwrap_or_default(),
        }
        .into());
    }
    Ok(Document {
        id: required_id(env.id)?,
        body: source_bytes(env.source),
    })
}

/// Search response. Hits keep the order the server reported.
pub fn decode_search(bytes: &[u8]) -> Result<Vec<Document>> {
    let env = envelope(bytes)?;
    env.hits
        .unwrap_or_default()
        .hits
        .into_iter()
        .map(|hit| {
            Ok(Document {
                id: required_id(hit.id)?,
                body: source_bytes(hit.source),
            })
        })
        .collect()
}

/// Update-by-id response. A `created` update means the id did not exist and
/// the store inserted instead.
pub fn decode_update(bytes: &[u8]) -> Result<()> {
    let env = envelope(bytes)?;
    if truthy(env.created, env.result.as_deref(), "created") {
        return Err(StateError::Upserted {
            id: env.id.unwrap_or_default(),
        }
        .into());
    }
    Ok(())
}

pub fn decode_delete(bytes: &[u8]) -> Result<()> {
    let env = envelope(bytes)?;
    if !truthy(env.found, env.result.as_deref(), "deleted") {
        return Err(StateError::NotFound {
            id: env.id.unwrap_or_default(),
        }
        .into());
    }
    Ok(())
}

pub fn decode_delete_index(bytes: &[u8]) -> Result<()> {
    let env = envelope(bytes)?;
    if env.acknowledged != Some(true) {
        return Err(StateError::NotAcknowledged.into());
    }
    Ok(())
}

pub fn decode_bulk_insert(bytes: &[u8], submitted: usize) -> Result<Vec<String>> {
    decode_bulk(
        bytes,
        submitted,
        |item| item.index.as_ref().or(item.create.as_ref()),
        |sub| truthy(sub.created, sub.result.as_deref(), "created"),
    )
}

pub fn decode_bulk_update(bytes: &[u8], submitted: usize) -> Result<Vec<String>> {
    decode_bulk(
        bytes,
        submitted,
        |item| item.update.as_ref(),
        |sub| sub.status.map_or(true, |status| status < 299),
    )
}

pub fn decode_bulk_delete(bytes: &[u8], submitted: usize) -> Result<Vec<String>> {
    decode_bulk(
        bytes,
        submitted,
        |item| item.delete.as_ref(),
        |sub| truthy(sub.found, sub.result.as_deref(), "deleted"),
    )
}

/// Collect ids by position. Any failed item turns the whole call into
/// `PartialBulkFailure`, which still carries every id.
///
/// `submitted` is the number of operations sent. Positions the response does
/// not report get an empty id and count as failed; items past `submitted`
/// answer nothing that was asked and fail as well.
fn decode_bulk(
    bytes: &[u8],
    submitted: usize,
    pick: fn(&BulkItem) -> Option<&ItemEnvelope>,
    succeeded: fn(&ItemEnvelope) -> bool,
) -> Result<Vec<String>> {
    let env = envelope(bytes)?;
    let len = env.items.len().max(submitted);
    let mut ids = Vec::with_capacity(len);
    let mut failed = Vec::new();

    for pos in 0..len {
        let Some(sub) = env.items.get(pos).and_then(pick) else {
            ids.push(String::new());
            failed.push(pos);
            continue;
        };
        let id = sub.id.clone().unwrap_or_default();
        if pos >= submitted || id.is_empty() || sub.error.is_some() || !succeeded(sub) {
            failed.push(pos);
        }
        ids.push(id);
    }

    if failed.is_empty() {
        Ok(ids)
    } else {
        Err(Error::PartialBulkFailure { ids, failed })
    }
}

/// Turn an error response body into `Error::Server`. Root-cause reasons are
/// concatenated, each prefixed with `,`. If the body cannot be parsed, the
/// parse failure is returned instead.
pub fn decode_server_error(bytes: &[u8]) -> Error {
    let env = match envelope(bytes) {
        Ok(env) => env,
        Err(err) => return err,
    };

    let reason = match env.error {
        Some(ErrorField::Detail(detail)) if !detail.root_cause.is_empty() => detail
            .root_cause
            .iter()
            .map(|cause| format!(",{}", cause.reason.as_deref().unwrap_or_default()))
            .collect(),
        Some(ErrorField::Detail(detail)) => detail.reason.unwrap_or_default(),
        Some(ErrorField::Message(message)) => message,
        None => String::new(),
    };

    Error::Server { reason }
}
