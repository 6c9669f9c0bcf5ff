use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, router, Db};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(request(method, uri, body)).await.unwrap();
    let status = resp.status();
    (status, body_json(resp).await)
}

fn ndjson(lines: &[Value]) -> String {
    lines.iter().map(|line| format!("{line}\n")).collect()
}

// --- insert ---

#[tokio::test]
async fn insert_returns_201_with_generated_id() {
    let app = app();
    let (status, json) = send(&app, "POST", "/logs/entry?refresh=true", r#"{"Message":"hello"}"#).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["created"], true);
    assert_eq!(json["result"], "created");
    assert_eq!(json["_index"], "logs");
    assert_eq!(json["_type"], "entry");
    assert!(!json["_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn insert_rejects_non_object_body() {
    let app = app();
    let (status, json) = send(&app, "POST", "/logs/entry", "[1,2]").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["type"], "mapper_parsing_exception");
    assert_eq!(json["status"], 400);
}

// --- get ---

#[tokio::test]
async fn get_returns_source_of_inserted_document() {
    let app = app();
    let (_, created) = send(&app, "POST", "/logs/entry", r#"{"Message":"hello"}"#).await;
    let id = created["_id"].as_str().unwrap();

    let (status, json) = send(&app, "GET", &format!("/logs/entry/{id}"), "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["found"], true);
    assert_eq!(json["_id"], id);
    assert_eq!(json["_source"], json!({"Message": "hello"}));
}

#[tokio::test]
async fn get_missing_document_is_not_found_in_body() {
    let app = app();
    let (status, json) = send(&app, "GET", "/logs/entry/nope", "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["found"], false);
    assert!(json.get("_source").is_none());
}

// --- update ---

#[tokio::test]
async fn put_creates_then_replaces() {
    let app = app();
    let (status, json) = send(&app, "PUT", "/logs/entry/a", r#"{"v":1,"w":1}"#).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["created"], true);
    assert_eq!(json["result"], "created");

    let (status, json) = send(&app, "PUT", "/logs/entry/a?refresh=true", r#"{"v":2}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["created"], false);
    assert_eq!(json["result"], "updated");
    assert_eq!(json["_version"], 2);

    let (_, json) = send(&app, "GET", "/logs/entry/a", "").await;
    assert_eq!(json["_source"], json!({"v": 2}));
}

// --- delete ---

#[tokio::test]
async fn delete_reports_found() {
    let app = app();
    send(&app, "PUT", "/logs/entry/a", "{}").await;

    let (status, json) = send(&app, "DELETE", "/logs/entry/a", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["found"], true);
    assert_eq!(json["result"], "deleted");

    let (status, json) = send(&app, "DELETE", "/logs/entry/a", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["found"], false);
    assert_eq!(json["result"], "not_found");
}

// --- search ---

#[tokio::test]
async fn search_missing_index_returns_404_envelope() {
    let app = app();
    let (status, json) = send(&app, "GET", "/nope/_search", "").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
    assert_eq!(json["error"]["type"], "index_not_found_exception");
    assert_eq!(json["error"]["root_cause"][0]["reason"], "no such index [nope]");
}

#[tokio::test]
async fn search_empty_index_returns_no_hits() {
    let app = app();
    send(&app, "PUT", "/logs/entry/a", "{}").await;
    send(&app, "DELETE", "/logs/entry/a", "").await;

    let (status, json) = send(&app, "GET", "/logs/_search", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hits"]["total"], 0);
    assert_eq!(json["hits"]["hits"], json!([]));
}

#[tokio::test]
async fn search_type_filters_by_query_in_insertion_order() {
    let app = app();
    send(&app, "PUT", "/logs/entry/a", r#"{"Message":"hello"}"#).await;
    send(&app, "PUT", "/logs/entry/b", r#"{"Message":"bye"}"#).await;
    send(&app, "PUT", "/logs/other/c", r#"{"Message":"hello"}"#).await;
    send(&app, "PUT", "/logs/entry/d", r#"{"Message":"hello"}"#).await;

    let (status, json) = send(&app, "GET", "/logs/entry/_search?q=Message:hello", "").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json["hits"]["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["a", "d"]);
    assert_eq!(json["hits"]["hits"][0]["_source"], json!({"Message": "hello"}));

    let (_, json) = send(&app, "GET", "/logs/_search?q=Message:hello", "").await;
    assert_eq!(json["hits"]["total"], 3);
}

#[tokio::test]
async fn search_with_unparseable_query_returns_400() {
    let app = app();
    send(&app, "PUT", "/logs/entry/a", "{}").await;

    let (status, json) = send(&app, "GET", "/logs/_search?q=hello", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["type"], "query_parsing_exception");
}

// --- drop index ---

#[tokio::test]
async fn drop_index_removes_documents() {
    let app = app();
    send(&app, "PUT", "/logs/entry/a", "{}").await;

    let (status, json) = send(&app, "DELETE", "/logs", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["acknowledged"], true);

    let (status, _) = send(&app, "GET", "/logs/_search", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(&app, "DELETE", "/logs", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["acknowledged"], true);
}

// --- bulk ---

#[tokio::test]
async fn bulk_applies_items_in_order() {
    let app = app();
    send(&app, "PUT", "/logs/entry/a", r#"{"n":1}"#).await;

    let body = ndjson(&[
        json!({"index": {"_index": "logs", "_type": "entry"}}),
        json!({"n": 2}),
        json!({"update": {"_index": "logs", "_type": "entry", "_id": "a"}}),
        json!({"doc": {"m": 1}}),
        json!({"delete": {"_index": "logs", "_type": "entry", "_id": "missing"}}),
    ]);
    let (status, json) = send(&app, "POST", "/_bulk", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["errors"], true);
    assert_eq!(json["items"][0]["index"]["created"], true);
    assert_eq!(json["items"][1]["update"]["status"], 200);
    assert_eq!(json["items"][2]["delete"]["found"], false);

    let (_, doc) = send(&app, "GET", "/logs/entry/a", "").await;
    assert_eq!(doc["_source"], json!({"n": 1, "m": 1}));
}

#[tokio::test]
async fn typed_bulk_path_supplies_defaults() {
    let app = app();
    let body = ndjson(&[json!({"index": {}}), json!({"n": 1}), json!({"index": {}}), json!({"n": 2})]);
    let (status, json) = send(&app, "POST", "/logs/entry/_bulk?refresh=true", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["errors"], false);
    assert_eq!(json["items"].as_array().unwrap().len(), 2);
    assert_eq!(json["items"][1]["index"]["_index"], "logs");

    let (_, json) = send(&app, "GET", "/logs/entry/_search", "").await;
    assert_eq!(json["hits"]["total"], 2);
}

#[tokio::test]
async fn bulk_create_conflicts_with_existing_id() {
    let app = app();
    send(&app, "PUT", "/logs/entry/a", r#"{"n":1}"#).await;

    let body = ndjson(&[json!({"create": {"_id": "a"}}), json!({"n": 2})]);
    let (status, json) = send(&app, "POST", "/logs/entry/_bulk", &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["errors"], true);
    assert_eq!(json["items"][0]["create"]["status"], 409);
    assert_eq!(json["items"][0]["create"]["error"]["type"], "version_conflict_engine_exception");

    let (_, doc) = send(&app, "GET", "/logs/entry/a", "").await;
    assert_eq!(doc["_source"], json!({"n": 1}));
}

#[tokio::test]
async fn malformed_bulk_changes_nothing() {
    let app = app();
    let body = ndjson(&[json!({"index": {"_index": "logs", "_type": "entry"}}), json!({"n": 1}), json!({"delete": {}})]);
    let (status, json) = send(&app, "POST", "/_bulk", &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["type"], "action_request_validation_exception");

    let (status, _) = send(&app, "GET", "/logs/_search", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- shared store ---

#[tokio::test]
async fn injected_store_observes_writes() {
    let db = Db::default();
    let app = router(db.clone());
    send(&app, "PUT", "/logs/entry/a", "{}").await;

    assert!(db.read().await.get("logs", "entry", "a").is_some());
}
