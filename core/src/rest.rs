//! Protocol operations against a document store.
//!
//! # Design
//! `Rest` holds a parsed URI template and a `Transport`, nothing else. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! (pure, testable without a server) and a call that sends it and runs the
//! matching `decode_*` function. Writes pass `refresh=true` so the change is
//! visible to the next search.

use crate::bulk;
use crate::decode;
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest};
use crate::options::Options;
use crate::transport::{send, Transport, UreqTransport};
use crate::types::{Address, Document};
use crate::uri::UriTemplate;

const REFRESH: &[(&str, &str)] = &[("refresh", "true")];
const SEARCH: &str = "_search";
const BULK: &str = "_bulk";
const ADDRESS_VARS: [&str; 4] = ["index", "type", "id", "suffix"];

/// Stateless protocol client. Cheap to clone and safe to share.
#[derive(Debug, Clone)]
pub struct Rest<T = UreqTransport> {
    template: UriTemplate,
    transport: T,
}

impl Rest<UreqTransport> {
    pub fn from_options(options: &Options) -> Result<Self> {
        Self::new(&options.template()?, options.transport())
    }
}

impl<T: Transport> Rest<T> {
    /// `template` is a base URL followed by an `{/index,type,id,suffix}` group.
    /// Every one of those variables must be declared.
    pub fn new(template: &str, transport: T) -> Result<Self> {
        let template = UriTemplate::parse(template)?;
        let declared: Vec<&str> = template.variables().collect();
        if let Some(missing) = ADDRESS_VARS.into_iter().find(|name| !declared.contains(name)) {
            return Err(Error::MalformedTemplate(format!("missing variable {missing:?}")));
        }
        Ok(Self { template, transport })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn url(&self, address: Address<'_>, query: Option<&[(&str, &str)]>) -> String {
        self.template.expand(&address.path_vars(), query)
    }

    fn call(&self, request: HttpRequest) -> Result<Vec<u8>> {
        send(&self.transport, &request)
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_search_index(&self, index: &str, query: &str) -> HttpRequest {
        let url = self.url(Address::new(index).suffix(SEARCH), Some(&[("q", query)]));
        HttpRequest::json(HttpMethod::Get, url, None)
    }

    pub fn build_search_type(&self, index: &str, doc_type: &str, query: &str) -> HttpRequest {
        let address = Address::new(index).doc_type(doc_type).suffix(SEARCH);
        HttpRequest::json(HttpMethod::Get, self.url(address, Some(&[("q", query)])), None)
    }

    pub fn build_delete_index(&self, index: &str) -> HttpRequest {
        HttpRequest::json(HttpMethod::Delete, self.url(Address::new(index), None), None)
    }

    pub fn build_insert_document(&self, index: &str, doc_type: &str, body: &[u8]) -> HttpRequest {
        let url = self.url(Address::new(index).doc_type(doc_type), Some(REFRESH));
        HttpRequest::json(HttpMethod::Post, url, Some(body.to_vec()))
    }

    pub fn build_get_document(&self, index: &str, doc_type: &str, id: &str) -> HttpRequest {
        let url = self.url(Address::new(index).doc_type(doc_type).id(id), None);
        HttpRequest::json(HttpMethod::Get, url, None)
    }

    pub fn build_update_document(&self, index: &str, doc_type: &str, id: &str, body: &[u8]) -> HttpRequest {
        let url = self.url(Address::new(index).doc_type(doc_type).id(id), Some(REFRESH));
        HttpRequest::json(HttpMethod::Put, url, Some(body.to_vec()))
    }

    pub fn build_delete_document(&self, index: &str, doc_type: &str, id: &str) -> HttpRequest {
        let url = self.url(Address::new(index).doc_type(doc_type).id(id), Some(REFRESH));
        HttpRequest::json(HttpMethod::Delete, url, None)
    }

    pub fn build_bulk_insert(&self, index: &str, doc_type: &str, bodies: &[Vec<u8>]) -> Result<HttpRequest> {
        let lines = bulk::insert_lines(index, doc_type, bodies)?;
        Ok(self.bulk_request(index, doc_type, lines))
    }

    pub fn build_bulk_update(&self, index: &str, doc_type: &str, docs: &[Document]) -> Result<HttpRequest> {
        let lines = bulk::update_lines(index, doc_type, docs)?;
        Ok(self.bulk_request(index, doc_type, lines))
    }

    pub fn build_bulk_delete(&self, index: &str, doc_type: &str, ids: &[String]) -> Result<HttpRequest> {
        let lines = bulk::delete_lines(index, doc_type, ids)?;
        Ok(self.bulk_request(index, doc_type, lines))
    }

    fn bulk_request(&self, index: &str, doc_type: &str, lines: Vec<Vec<u8>>) -> HttpRequest {
        let url = self.url(Address::new(index).doc_type(doc_type).suffix(BULK), Some(REFRESH));
        HttpRequest::bulk(HttpMethod::Post, url, lines)
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Search every type of `index`. `query` is `field:value` or `*:*`.
    pub fn search_index(&self, index: &str, query: &str) -> Result<Vec<Document>> {
        let body = self.call(self.build_search_index(index, query))?;
        decode::decode_search(&body)
    }

    pub fn search_type(&self, index: &str, doc_type: &str, query: &str) -> Result<Vec<Document>> {
        let body = self.call(self.build_search_type(index, doc_type, query))?;
        decode::decode_search(&body)
    }

    pub fn delete_index(&self, index: &str) -> Result<()> {
        let body = self.call(self.build_delete_index(index))?;
        decode::decode_delete_index(&body)
    }

    /// Insert a document under a server-assigned id.
    pub fn insert_document(&self, index: &str, doc_type: &str, body: &[u8]) -> Result<Document> {
        let response = self.call(self.build_insert_document(index, doc_type, body))?;
        decode::decode_insert(&response)
    }

    pub fn get_document(&self, index: &str, doc_type: &str, id: &str) -> Result<Document> {
        let body = self.call(self.build_get_document(index, doc_type, id))?;
        decode::decode_get(&body)
    }

    /// Replace the body of an existing document. Fails with
    /// `StateError::Upserted` if the id did not exist.
    pub fn update_document(&self, index: &str, doc_type: &str, id: &str, body: &[u8]) -> Result<()> {
        let response = self.call(self.build_update_document(index, doc_type, id, body))?;
        decode::decode_update(&response)
    }

    pub fn delete_document(&self, index: &str, doc_type: &str, id: &str) -> Result<()> {
        let body = self.call(self.build_delete_document(index, doc_type, id))?;
        decode::decode_delete(&body)
    }

    pub fn bulk_insert_documents(&self, index: &str, doc_type: &str, bodies: &[Vec<u8>]) -> Result<Vec<String>> {
        if bodies.is_empty() {
            return Ok(Vec::new());
        }
        let body = self.call(self.build_bulk_insert(index, doc_type, bodies)?)?;
        decode::decode_bulk_insert(&body, bodies.len())
    }

    /// Merge each document's body into the stored document with the same id.
    pub fn bulk_update_documents(&self, index: &str, doc_type: &str, docs: &[Document]) -> Result<Vec<String>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let body = self.call(self.build_bulk_update(index, doc_type, docs)?)?;
        decode::decode_bulk_update(&body, docs.len())
    }

    pub fn bulk_delete_documents(&self, index: &str, doc_type: &str, ids: &[String]) -> Result<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let body = self.call(self.build_bulk_delete(index, doc_type, ids)?)?;
        decode::decode_bulk_delete(&body, ids.len())
    }
}
