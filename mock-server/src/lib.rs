//! Offline stand-in for the document store's REST API.
//!
//! # Design
//! Routes mirror the paths the client builds: `/{index}` for index-wide
//! operations, `/{index}/{type}` for inserts and type searches, and
//! `/{index}/{type}/{id}` for single documents. Bulk bodies are accepted at
//! `/_bulk` and `/{index}/{type}/_bulk`.
//!
//! All state lives in one [`Store`] behind a `tokio` `RwLock` that the caller
//! owns and passes to [`router`]; handlers never reach for globals. Query
//! parameters the mock has no use for (such as `refresh`) are ignored.

pub mod bulk;
pub mod envelope;
pub mod error;
pub mod query;
pub mod store;

use std::{sync::Arc, time::Instant};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

use crate::envelope::{
    BulkResponse, DeleteIndexResponse, DeleteResponse, GetResponse, IndexResponse, SearchResponse, Shards,
    UpdateResponse,
};
use crate::error::ApiError;
use crate::query::SearchQuery;
pub use crate::store::Store;

pub type Db = Arc<RwLock<Store>>;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// A router over a fresh, empty store.
pub fn app() -> Router {
    router(Db::default())
}

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/_bulk", post(bulk_any))
        .route("/{index}", delete(drop_index))
        .route("/{index}/_search", get(search_index))
        .route("/{index}/{doc_type}", post(insert_document))
        .route("/{index}/{doc_type}/_search", get(search_type))
        .route("/{index}/{doc_type}/_bulk", post(bulk_typed))
        .route(
            "/{index}/{doc_type}/{id}",
            get(get_document).put(update_document).delete(delete_document),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, Db::default()).await
}

/// Serve `db` until the listener fails.
pub async fn serve(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, router(db)).await
}

fn document(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    bulk::parse_object(body).map_err(ApiError::MapperParsing)
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}

async fn search_index(
    State(db): State<Db>,
    Path(index): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();
    let query = SearchQuery::parse(params.q.as_deref())?;
    let store = db.read().await;
    let hits = store.search_index(&index, &query)?;
    tracing::debug!(%index, ?query, hits = hits.len(), "search index");
    Ok(Json(SearchResponse::new(&index, elapsed_ms(start), hits)))
}

async fn search_type(
    State(db): State<Db>,
    Path((index, doc_type)): Path<(String, String)>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = Instant::now();
    let query = SearchQuery::parse(params.q.as_deref())?;
    let store = db.read().await;
    let hits = store.search_type(&index, &doc_type, &query)?;
    tracing::debug!(%index, %doc_type, ?query, hits = hits.len(), "search type");
    Ok(Json(SearchResponse::new(&index, elapsed_ms(start), hits)))
}

async fn drop_index(State(db): State<Db>, Path(index): Path<String>) -> Json<DeleteIndexResponse> {
    let existed = db.write().await.drop_index(&index);
    tracing::debug!(%index, existed, "drop index");
    Json(DeleteIndexResponse { acknowledged: true })
}

async fn insert_document(
    State(db): State<Db>,
    Path((index, doc_type)): Path<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<IndexResponse>), ApiError> {
    let body = document(&body)?;
    let doc = db.write().await.insert(&index, &doc_type, body);
    tracing::debug!(%index, %doc_type, id = %doc.id, "insert document");
    Ok((
        StatusCode::CREATED,
        Json(IndexResponse {
            shards: Shards::single(),
            index,
            doc_type,
            id: doc.id,
            version: doc.version,
            created: true,
            result: "created".into(),
        }),
    ))
}

async fn get_document(
    State(db): State<Db>,
    Path((index, doc_type, id)): Path<(String, String, String)>,
) -> Json<GetResponse> {
    let store = db.read().await;
    let doc = store.get(&index, &doc_type, &id);
    tracing::debug!(%index, %doc_type, %id, found = doc.is_some(), "get document");
    Json(GetResponse {
        version: doc.map(|d| d.version),
        found: doc.is_some(),
        source: doc.map(|d| d.body.clone()),
        index,
        doc_type,
        id,
    })
}

async fn update_document(
    State(db): State<Db>,
    Path((index, doc_type, id)): Path<(String, String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<UpdateResponse>), ApiError> {
    let body = document(&body)?;
    let upserted = db.write().await.upsert(&index, &doc_type, &id, body);
    tracing::debug!(%index, %doc_type, %id, was_update = upserted.was_update, "update document");
    let status = if upserted.was_update {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(UpdateResponse {
            shards: Shards::single(),
            index,
            doc_type,
            id,
            version: upserted.version,
            result: if upserted.was_update { "updated" } else { "created" }.into(),
            created: !upserted.was_update,
        }),
    ))
}

async fn delete_document(
    State(db): State<Db>,
    Path((index, doc_type, id)): Path<(String, String, String)>,
) -> Json<DeleteResponse> {
    let version = db.write().await.delete(&index, &doc_type, &id);
    tracing::debug!(%index, %doc_type, %id, found = version.is_some(), "delete document");
    Json(DeleteResponse {
        shards: Shards::single(),
        found: version.is_some(),
        index,
        doc_type,
        id,
        version: version.unwrap_or(1),
        result: if version.is_some() { "deleted" } else { "not_found" }.into(),
    })
}

async fn bulk_any(State(db): State<Db>, body: Bytes) -> Result<Json<BulkResponse>, ApiError> {
    apply_bulk(db, &body, None, None).await
}

async fn bulk_typed(
    State(db): State<Db>,
    Path((index, doc_type)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<BulkResponse>, ApiError> {
    apply_bulk(db, &body, Some(index.as_str()), Some(doc_type.as_str())).await
}

async fn apply_bulk(
    db: Db,
    body: &[u8],
    index: Option<&str>,
    doc_type: Option<&str>,
) -> Result<Json<BulkResponse>, ApiError> {
    let start = Instant::now();
    let ops = bulk::parse(body, index, doc_type)?;
    let count = ops.len();
    let response = {
        let mut store = db.write().await;
        bulk::apply(&mut store, ops, || elapsed_ms(start))
    };
    tracing::debug!(items = count, errors = response.errors, "bulk");
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_params_q_is_optional() {
        let params: SearchParams = serde_json::from_str("{}").unwrap();
        assert!(params.q.is_none());
    }

    #[test]
    fn body_must_be_an_object() {
        assert!(document(br#"{"a":1}"#).is_ok());
        assert!(matches!(document(b"[1]"), Err(ApiError::MapperParsing(_))));
        assert!(matches!(document(b"{"), Err(ApiError::MapperParsing(_))));
    }

    #[tokio::test]
    async fn injected_store_is_shared_with_router() {
        let db = Db::default();
        let _router = router(db.clone());
        db.write().await.insert("i", "t", Map::new());
        assert!(db.read().await.has_index("i"));
    }
}
