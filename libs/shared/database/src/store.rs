use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// Key/JSON-document store consumed by the services.
///
/// Paths are JSONPath expressions restricted to the document root (`$`) or a
/// single top-level field (`$.slots`). The legacy `.`-prefixed spelling is
/// accepted as well.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Whole document at `key`, or `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write `document` at `path`. Writing a field requires the key to exist.
    async fn set(&self, key: &str, path: &str, document: &Value) -> Result<(), StoreError>;

    /// Append `element` to the array at `path` in a single store operation.
    async fn arr_append(&self, key: &str, path: &str, element: &Value) -> Result<(), StoreError>;

    /// Keys matching a glob pattern (`*`, `?`).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Batch read of `path` from each key; absent keys yield `None` in place.
    async fn mget(&self, keys: &[String], path: &str) -> Result<Vec<Option<Value>>, StoreError>;

    /// Query a secondary index registered with [`DocumentStore::create_index`].
    async fn search(
        &self,
        index: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchDocument>, StoreError>;

    /// Declare a secondary index. Registering an existing index is a no-op.
    async fn create_index(&self, schema: &IndexSchema) -> Result<(), StoreError>;

    /// Try to take an expiring exclusive lease on `key`. `None` means another
    /// holder owns it right now.
    async fn acquire_lease(&self, key: &str, ttl: Duration) -> Result<Option<Lease>, StoreError>;

    /// Drop a lease if it is still held by this owner.
    async fn release_lease(&self, lease: &Lease) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub key: String,
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Exact-match field.
    Tag,
    /// Full-text field, matched case-insensitively.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexField {
    pub path: String,
    pub alias: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub name: String,
    pub prefix: String,
    pub fields: Vec<IndexField>,
}

impl IndexSchema {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, path: &str, alias: &str, kind: FieldKind) -> Self {
        self.fields.push(IndexField {
            path: path.to_string(),
            alias: alias.to_string(),
            kind,
        });
        self
    }

    pub fn field_by_alias(&self, alias: &str) -> Option<&IndexField> {
        self.fields.iter().find(|field| field.alias == alias)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub kind: FieldKind,
    pub value: String,
}

/// Conjunction of `all`, further restricted to documents matching at least
/// one of `any` when that list is non-empty. Results are paged by `offset`
/// and `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub all: Vec<FieldFilter>,
    pub any: Vec<FieldFilter>,
    pub offset: usize,
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            all: Vec::new(),
            any: Vec::new(),
            offset: 0,
            limit,
        }
    }

    pub fn starting_at(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn require(mut self, field: &str, kind: FieldKind, value: &str) -> Self {
        self.all.push(FieldFilter {
            field: field.to_string(),
            kind,
            value: value.to_string(),
        });
        self
    }

    pub fn any_of(mut self, field: &str, kind: FieldKind, value: &str) -> Self {
        self.any.push(FieldFilter {
            field: field.to_string(),
            kind,
            value: value.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchDocument {
    pub id: String,
    pub value: Value,
}

/// Top-level field addressed by `path`, `None` for the root.
pub fn path_field(path: &str) -> Result<Option<&str>, StoreError> {
    let trimmed = path.strip_prefix('$').unwrap_or(path);
    match trimmed {
        "" | "." => Ok(None),
        field => {
            let name = field
                .strip_prefix('.')
                .filter(|name| !name.is_empty() && !name.contains(&['.', '[', '*'][..]))
                .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;
            Ok(Some(name))
        }
    }
}

/// Redis-style glob match supporting `*`, `?` and backslash escapes.
pub fn glob_match(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();
    glob_match_from(&pattern, &candidate)
}

fn glob_match_from(pattern: &[char], candidate: &[char]) -> bool {
    match pattern.split_first() {
        None => candidate.is_empty(),
        Some(('*', rest)) => {
            (0..=candidate.len()).any(|skip| glob_match_from(rest, &candidate[skip..]))
        }
        Some(('?', rest)) => !candidate.is_empty() && glob_match_from(rest, &candidate[1..]),
        Some(('\\', rest)) if !rest.is_empty() => {
            candidate.first() == Some(&rest[0]) && glob_match_from(&rest[1..], &candidate[1..])
        }
        Some((c, rest)) => candidate.first() == Some(c) && glob_match_from(rest, &candidate[1..]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_path_field() {
        assert_eq!(path_field("$").unwrap(), None);
        assert_eq!(path_field(".").unwrap(), None);
        assert_eq!(path_field("$.slots").unwrap(), Some("slots"));
        assert_eq!(path_field(".slots").unwrap(), Some("slots"));
        assert_matches!(path_field("$.slots[0]"), Err(StoreError::InvalidPath(_)));
        assert_matches!(path_field("slots"), Err(StoreError::InvalidPath(_)));
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("booked:slots:*", "booked:slots:a@b.com:20240501"));
        assert!(glob_match("booked:slots:*:20240501", "booked:slots:a@b.com:20240501"));
        assert!(!glob_match("booked:slots:*:20240501", "booked:slots:a@b.com:20240502"));
        assert!(glob_match("lock:?", "lock:x"));
        assert!(!glob_match("lock:?", "lock:xy"));
        assert!(glob_match("a\\*b", "a*b"));
        assert!(!glob_match("a\\*b", "axb"));
    }

    #[test]
    fn test_search_query_builder() {
        let query = SearchQuery::new(10)
            .require("date", FieldKind::Tag, "20240501")
            .any_of("name", FieldKind::Text, "alice");
        assert_eq!(query.all.len(), 1);
        assert_eq!(query.any.len(), 1);
        assert_eq!(query.limit, 10);
    }
}
