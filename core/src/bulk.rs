//! Builders for the newline-delimited bulk format.
//!
//! Inserts are `(action, source)` pairs, updates are `(action, {"doc": ...})`
//! pairs, deletes are a lone action line per document.

use serde::Serialize;
use serde_json::value::RawValue;

use crate::error::{Error, Result};
use crate::types::Document;

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum BulkAction<'a> {
    Index(Target<'a>),
    Update(Target<'a>),
    Delete(Target<'a>),
}

#[derive(Debug, Serialize)]
struct Target<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
    #[serde(rename = "_type")]
    doc_type: &'a str,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdatePayload<'a> {
    doc: &'a RawValue,
}

pub fn insert_lines(index: &str, doc_type: &str, bodies: &[Vec<u8>]) -> Result<Vec<Vec<u8>>> {
    let action = encode(&BulkAction::Index(Target {
        index,
        doc_type,
        id: None,
    }))?;

    let mut lines = Vec::with_capacity(bodies.len() * 2);
    for body in bodies {
        lines.push(action.clone());
        lines.push(body.clone());
    }
    Ok(lines)
}

pub fn update_lines(index: &str, doc_type: &str, docs: &[Document]) -> Result<Vec<Vec<u8>>> {
    let mut lines = Vec::with_capacity(docs.len() * 2);
    for doc in docs {
        lines.push(encode(&BulkAction::Update(Target {
            index,
            doc_type,
            id: Some(&doc.id),
        }))?);

        let partial: &RawValue = serde_json::from_slice(&doc.body).map_err(Error::Encode)?;
        lines.push(encode(&UpdatePayload { doc: partial })?);
    }
    Ok(lines)
}

pub fn delete_lines(index: &str, doc_type: &str, ids: &[String]) -> Result<Vec<Vec<u8>>> {
    ids.iter()
        .map(|id| {
            encode(&BulkAction::Delete(Target {
                index,
                doc_type,
                id: Some(id),
            }))
        })
        .collect()
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(Error::Encode)
}
