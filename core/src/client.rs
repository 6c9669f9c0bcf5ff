//! Convenience handles over `Rest`: a client, an index within it, and a type
//! within that index. They hold names only and delegate every call.
//!
//! Referencing an index or type never creates it; the store creates both the
//! first time a write targets them.

use crate::error::Result;
use crate::options::Options;
use crate::rest::Rest;
use crate::transport::{Transport, UreqTransport};
use crate::types::Document;

#[derive(Debug, Clone)]
pub struct Client<T = UreqTransport> {
    rest: Rest<T>,
}

impl Client<UreqTransport> {
    pub fn new(options: &Options) -> Result<Self> {
        Ok(Self {
            rest: Rest::from_options(options)?,
        })
    }
}

impl<T: Transport> Client<T> {
    pub fn with_rest(rest: Rest<T>) -> Self {
        Self { rest }
    }

    pub fn rest(&self) -> &Rest<T> {
        &self.rest
    }

    pub fn index(&self, name: impl Into<String>) -> Index<'_, T> {
        Index {
            rest: &self.rest,
            name: name.into(),
        }
    }
}

/// A named index.
#[derive(Debug, Clone)]
pub struct Index<'c, T = UreqTransport> {
    rest: &'c Rest<T>,
    name: String,
}

impl<'c, T: Transport> Index<'c, T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A named type (sub-collection) inside this index.
    pub fn doc_type(&self, name: impl Into<String>) -> Type<'c, T> {
        Type {
            rest: self.rest,
            index: self.name.clone(),
            name: name.into(),
        }
    }

    /// Exact-match search across every type of the index.
    pub fn search(&self, query: &str) -> Result<Vec<Document>> {
        self.rest.search_index(&self.name, query)
    }

    /// Delete the index and every document in it.
    pub fn drop(&self) -> Result<()> {
        self.rest.delete_index(&self.name)
    }
}

/// A named type within an index.
#[derive(Debug, Clone)]
pub struct Type<'c, T = UreqTransport> {
    rest: &'c Rest<T>,
    index: String,
    name: String,
}

impl<T: Transport> Type<'_, T> {
    pub fn index_name(&self) -> &str {
        &self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn search(&self, query: &str) -> Result<Vec<Document>> {
        self.rest.search_type(&self.index, &self.name, query)
    }

    /// Documents matching `field:value` pairs in `query`.
    pub fn find(&self, query: &str) -> Result<Vec<Document>> {
        self.search(query)
    }

    pub fn insert(&self, body: &[u8]) -> Result<Document> {
        self.rest.insert_document(&self.index, &self.name, body)
    }

    pub fn bulk_insert(&self, bodies: &[Vec<u8>]) -> Result<Vec<String>> {
        self.rest.bulk_insert_documents(&self.index, &self.name, bodies)
    }

    /// The document with `id`; a missing document is `StateError::NotFound`.
    pub fn find_by_id(&self, id: &str) -> Result<Document> {
        self.rest.get_document(&self.index, &self.name, id)
    }

    pub fn update_by_id(&self, id: &str, body: &[u8]) -> Result<()> {
        self.rest.update_document(&self.index, &self.name, id, body)
    }

    pub fn bulk_update(&self, docs: &[Document]) -> Result<Vec<String>> {
        self.rest.bulk_update_documents(&self.index, &self.name, docs)
    }

    pub fn delete_by_id(&self, id: &str) -> Result<()> {
        self.rest.delete_document(&self.index, &self.name, id)
    }

    pub fn bulk_delete(&self, ids: &[String]) -> Result<Vec<String>> {
        self.rest.bulk_delete_documents(&self.index, &self.name, ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_carry_names() {
        let client = Client::new(&Options::new("http://localhost:9201")).unwrap();
        let docs = client.index("test").doc_type("docs");
        assert_eq!(docs.index_name(), "test");
        assert_eq!(docs.name(), "docs");
        assert_eq!(client.index("other").name(), "other");
    }

    #[test]
    fn handles_address_the_right_paths() {
        let client = Client::new(&Options::new("http://localhost:9201")).unwrap();
        let req = client.rest().build_get_document("test", "docs", "abc");
        assert_eq!(req.url, "http://localhost:9201/test/docs/abc");
    }

    #[test]
    fn invalid_url_fails_construction() {
        assert!(Client::new(&Options::new("not a url")).is_err());
    }
}
