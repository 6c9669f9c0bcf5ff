use serde_json::{Map, Value};

use crate::error::StoreError;

/// The `q` parameter of a search: `*:*`, `field:value` or `field:*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    All,
    Exists(String),
    Term { field: String, value: String },
}

impl SearchQuery {
    /// An absent or blank query matches everything.
    pub fn parse(q: Option<&str>) -> Result<Self, StoreError> {
        let q = q.map(str::trim).unwrap_or_default();
        if q.is_empty() || q == "*" || q == "*:*" {
            return Ok(SearchQuery::All);
        }

        let (field, value) = q
            .split_once(':')
            .ok_or_else(|| StoreError::InvalidQuery(q.to_string()))?;
        if field.is_empty() || field == "*" {
            return Err(StoreError::InvalidQuery(q.to_string()));
        }

        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        Ok(match value {
            "*" => SearchQuery::Exists(field.to_string()),
            _ => SearchQuery::Term {
                field: field.to_string(),
                value: value.to_string(),
            },
        })
    }

    /// Exact, case-sensitive match against a top-level field. Numbers and
    /// booleans compare by their JSON text.
    pub fn matches(&self, body: &Map<String, Value>) -> bool {
        match self {
            SearchQuery::All => true,
            SearchQuery::Exists(field) => body.contains_key(field),
            SearchQuery::Term { field, value } => match body.get(field) {
                Some(Value::String(s)) => s == value,
                Some(Value::Number(n)) => n.to_string() == *value,
                Some(Value::Bool(b)) => b.to_string() == *value,
                _ => false,
            },
        }
    }
}
