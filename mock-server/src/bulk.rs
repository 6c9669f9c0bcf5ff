//! Newline-delimited bulk requests: parsing and application.
//!
//! A batch is parsed completely before any item touches the store, so a
//! malformed line rejects the whole request. Items are then applied in order
//! and each produces its own entry in the response.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::envelope::{BulkItem, BulkItemResult, BulkResponse, ErrorDetail};
use crate::error::ApiError;
use crate::store::Store;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Action {
    Index(Meta),
    Create(Meta),
    Update(Meta),
    Delete(Meta),
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(rename = "_index")]
    index: Option<String>,
    #[serde(rename = "_type")]
    doc_type: Option<String>,
    #[serde(rename = "_id")]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateSource {
    doc: Map<String, Value>,
}

/// A resolved bulk item.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Index {
        index: String,
        doc_type: String,
        id: Option<String>,
        body: Map<String, Value>,
    },
    /// Like `Index`, but an existing id is a conflict rather than a replacement.
    Create {
        index: String,
        doc_type: String,
        id: Option<String>,
        body: Map<String, Value>,
    },
    Update {
        index: String,
        doc_type: String,
        id: String,
        partial: Map<String, Value>,
    },
    Delete {
        index: String,
        doc_type: String,
        id: String,
    },
}

/// Parse a bulk body. `index`/`doc_type` from the request path fill in
/// metadata lines that omit them.
pub fn parse(body: &[u8], index: Option<&str>, doc_type: Option<&str>) -> Result<Vec<Operation>, ApiError> {
    let mut lines = body
        .split(|b| *b == b'\n')
        .enumerate()
        .filter(|(_, line)| !line.iter().all(u8::is_ascii_whitespace));
    let mut ops = Vec::new();

    while let Some((n, line)) = lines.next() {
        let action: Action = serde_json::from_slice(line)
            .map_err(|err| ApiError::InvalidBulk(format!("line {}: malformed action: {err}", n + 1)))?;

        let meta = match &action {
            Action::Index(meta) | Action::Create(meta) | Action::Update(meta) | Action::Delete(meta) => meta,
        };
        let target_index = meta
            .index
            .as_deref()
            .or(index)
            .ok_or_else(|| ApiError::InvalidBulk(format!("line {}: index is missing", n + 1)))?
            .to_string();
        let target_type = meta
            .doc_type
            .as_deref()
            .or(doc_type)
            .ok_or_else(|| ApiError::InvalidBulk(format!("line {}: type is missing", n + 1)))?
            .to_string();

        let mut source = || {
            lines
                .next()
                .map(|(m, source)| (m + 1, source))
                .ok_or_else(|| ApiError::InvalidBulk(format!("line {}: source is missing", n + 1)))
        };

        let op = match action {
            Action::Index(meta) => {
                let (m, source) = source()?;
                Operation::Index {
                    index: target_index,
                    doc_type: target_type,
                    id: meta.id,
                    body: parse_object(source).map_err(|err| ApiError::MapperParsing(format!("line {m}: {err}")))?,
                }
            }
            Action::Create(meta) => {
                let (m, source) = source()?;
                Operation::Create {
                    index: target_index,
                    doc_type: target_type,
                    id: meta.id,
                    body: parse_object(source).map_err(|err| ApiError::MapperParsing(format!("line {m}: {err}")))?,
                }
            }
            Action::Update(meta) => {
                let (m, source) = source()?;
                let update: UpdateSource = serde_json::from_slice(source)
                    .map_err(|err| ApiError::InvalidBulk(format!("line {m}: malformed update: {err}")))?;
                Operation::Update {
                    index: target_index,
                    doc_type: target_type,
                    id: required_id(meta.id, n)?,
                    partial: update.doc,
                }
            }
            Action::Delete(meta) => Operation::Delete {
                index: target_index,
                doc_type: target_type,
                id: required_id(meta.id, n)?,
            },
        };
        ops.push(op);
    }

    Ok(ops)
}

fn required_id(id: Option<String>, line: usize) -> Result<String, ApiError> {
    id.filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::InvalidBulk(format!("line {}: id is missing", line + 1)))
}

/// Parse a request body that must be a JSON object.
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, String> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("document must be a JSON object".to_string()),
        Err(err) => Err(err.to_string()),
    }
}

/// Apply every operation, in order, and describe each outcome.
pub fn apply(store: &mut Store, ops: Vec<Operation>, took: impl FnOnce() -> u64) -> BulkResponse {
    let items: Vec<BulkItem> = ops.into_iter().map(|op| apply_one(store, op)).collect();
    let errors = items.iter().any(|item| {
        let result = match item {
            BulkItem::Index(r) | BulkItem::Create(r) | BulkItem::Update(r) | BulkItem::Delete(r) => r,
        };
        result.status >= 300
    });
    BulkResponse {
        took: took(),
        errors,
        items,
    }
}

fn apply_one(store: &mut Store, op: Operation) -> BulkItem {
    match op {
        Operation::Index {
            index,
            doc_type,
            id: None,
            body,
        } => {
            let doc = store.insert(&index, &doc_type, body);
            BulkItem::Index(BulkItemResult {
                index,
                doc_type,
                id: doc.id,
                version: Some(doc.version),
                result: "created".into(),
                created: Some(true),
                found: None,
                status: 201,
                error: None,
            })
        }
        Operation::Index {
            index,
            doc_type,
            id: Some(id),
            body,
        } => {
            let upserted = store.upsert(&index, &doc_type, &id, body);
            BulkItem::Index(BulkItemResult {
                index,
                doc_type,
                id,
                version: Some(upserted.version),
                result: if upserted.was_update { "updated" } else { "created" }.into(),
                created: Some(!upserted.was_update),
                found: None,
                status: if upserted.was_update { 200 } else { 201 },
                error: None,
            })
        }
        Operation::Create {
            index,
            doc_type,
            id: Some(id),
            body: _,
        } if store.get(&index, &doc_type, &id).is_some() => BulkItem::Create(BulkItemResult {
            error: Some(ErrorDetail::new(
                "version_conflict_engine_exception",
                format!("[{doc_type}][{id}]: version conflict, document already exists"),
            )),
            version: store.get(&index, &doc_type, &id).map(|doc| doc.version),
            index,
            doc_type,
            id,
            result: "conflict".into(),
            created: Some(false),
            found: None,
            status: 409,
        }),
        Operation::Create {
            index,
            doc_type,
            id,
            body,
        } => match apply_one(store, Operation::Index { index, doc_type, id, body }) {
            BulkItem::Index(result) => BulkItem::Create(result),
            other => other,
        },
        Operation::Update {
            index,
            doc_type,
            id,
            partial,
        } => {
            let version = store.merge(&index, &doc_type, &id, partial);
            let error = match version {
                Some(_) => None,
                None => Some(ErrorDetail::new(
                    "document_missing_exception",
                    format!("[{doc_type}][{id}]: document missing"),
                )),
            };
            BulkItem::Update(BulkItemResult {
                result: if version.is_some() { "updated" } else { "not_found" }.into(),
                status: if version.is_some() { 200 } else { 404 },
                index,
                doc_type,
                id,
                version,
                created: None,
                found: None,
                error,
            })
        }
        Operation::Delete { index, doc_type, id } => {
            let version = store.delete(&index, &doc_type, &id);
            BulkItem::Delete(BulkItemResult {
                result: if version.is_some() { "deleted" } else { "not_found" }.into(),
                status: if version.is_some() { 200 } else { 404 },
                found: Some(version.is_some()),
                index,
                doc_type,
                id,
                version,
                created: None,
                error: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ndjson(lines: &[Value]) -> Vec<u8> {
        let mut body = Vec::new();
        for line in lines {
            body.extend(serde_json::to_vec(line).unwrap());
            body.push(b'\n');
        }
        body
    }

    #[test]
    fn parses_pairs_and_single_lines() {
        let body = ndjson(&[
            json!({"index": {"_index": "i", "_type": "t"}}),
            json!({"a": 1}),
            json!({"update": {"_index": "i", "_type": "t", "_id": "x"}}),
            json!({"doc": {"a": 2}}),
            json!({"delete": {"_index": "i", "_type": "t", "_id": "y"}}),
        ]);
        let ops = parse(&body, None, None).unwrap();
        assert_eq!(ops.len(), 3);
        assert!(matches!(&ops[0], Operation::Index { id: None, body, .. } if body["a"] == 1));
        assert!(matches!(&ops[1], Operation::Update { id, partial, .. } if id == "x" && partial["a"] == 2));
        assert!(matches!(&ops[2], Operation::Delete { id, .. } if id == "y"));
    }

    #[test]
    fn path_fills_missing_metadata() {
        let body = ndjson(&[json!({"delete": {"_id": "y"}})]);
        let ops = parse(&body, Some("i"), Some("t")).unwrap();
        assert_eq!(
            ops[0],
            Operation::Delete {
                index: "i".into(),
                doc_type: "t".into(),
                id: "y".into()
            }
        );
        assert!(matches!(parse(&body, None, None), Err(ApiError::InvalidBulk(_))));
    }

    #[test]
    fn rejects_incomplete_or_malformed_batches() {
        let missing_source = ndjson(&[json!({"index": {"_index": "i", "_type": "t"}})]);
        assert!(matches!(parse(&missing_source, None, None), Err(ApiError::InvalidBulk(_))));

        let missing_id = ndjson(&[json!({"delete": {"_index": "i", "_type": "t"}})]);
        assert!(matches!(parse(&missing_id, None, None), Err(ApiError::InvalidBulk(_))));

        assert!(matches!(parse(b"not json\n", None, None), Err(ApiError::InvalidBulk(_))));

        let bad_source = ndjson(&[json!({"index": {"_index": "i", "_type": "t"}}), json!([1, 2])]);
        assert!(matches!(parse(&bad_source, None, None), Err(ApiError::MapperParsing(_))));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let body = b"\n{\"delete\":{\"_index\":\"i\",\"_type\":\"t\",\"_id\":\"a\"}}\n\n";
        assert_eq!(parse(body, None, None).unwrap().len(), 1);
    }

    #[test]
    fn apply_reports_each_item_in_order() {
        let mut store = Store::new();
        store.upsert("i", "t", "a", Map::new());

        let ops = vec![
            Operation::Delete {
                index: "i".into(),
                doc_type: "t".into(),
                id: "a".into(),
            },
            Operation::Delete {
                index: "i".into(),
                doc_type: "t".into(),
                id: "b".into(),
            },
            Operation::Update {
                index: "i".into(),
                doc_type: "t".into(),
                id: "b".into(),
                partial: Map::new(),
            },
        ];
        let response = apply(&mut store, ops, || 3);
        assert_eq!(response.took, 3);
        assert!(response.errors);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["items"][0]["delete"]["found"], true);
        assert_eq!(json["items"][1]["delete"]["found"], false);
        assert_eq!(json["items"][1]["delete"]["_id"], "b");
        assert_eq!(json["items"][2]["update"]["status"], 404);
        assert_eq!(json["items"][2]["update"]["error"]["type"], "document_missing_exception");
    }

    #[test]
    fn create_is_parsed_separately_from_index() {
        let body = ndjson(&[json!({"create": {"_index": "i", "_type": "t", "_id": "a"}}), json!({"n": 1})]);
        let ops = parse(&body, None, None).unwrap();
        assert!(matches!(&ops[0], Operation::Create { id: Some(id), .. } if id == "a"));
    }

    #[test]
    fn create_never_replaces_an_existing_document() {
        let mut store = Store::new();
        store.upsert("i", "t", "a", json!({"n": 1}).as_object().unwrap().clone());

        let create = |id: &str| Operation::Create {
            index: "i".into(),
            doc_type: "t".into(),
            id: Some(id.into()),
            body: json!({"n": 2}).as_object().unwrap().clone(),
        };
        let response = apply(&mut store, vec![create("a"), create("b")], || 0);
        assert!(response.errors);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["items"][0]["create"]["status"], 409);
        assert_eq!(json["items"][0]["create"]["error"]["type"], "version_conflict_engine_exception");
        assert_eq!(json["items"][1]["create"]["status"], 201);
        assert_eq!(json["items"][1]["create"]["created"], true);

        assert_eq!(store.get("i", "t", "a").unwrap().body["n"], 1);
        assert_eq!(store.get("i", "t", "b").unwrap().body["n"], 2);
    }

    #[test]
    fn apply_inserts_with_fresh_ids() {
        let mut store = Store::new();
        let ops = vec![
            Operation::Index {
                index: "i".into(),
                doc_type: "t".into(),
                id: None,
                body: Map::new(),
            };
            2
        ];
        let response = apply(&mut store, ops, || 0);
        assert!(!response.errors);
        let ids: Vec<String> = response
            .items
            .iter()
            .map(|item| match item {
                BulkItem::Index(r) => r.id.clone(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_ne!(ids[0], ids[1]);
        assert!(store.get("i", "t", &ids[1]).is_some());
    }
}
