use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::{
    glob_match, path_field, DocumentStore, FieldFilter, FieldKind, IndexSchema, Lease,
    SearchDocument, SearchQuery,
};

/// Process-local [`DocumentStore`] with the same observable semantics as the
/// Redis backend. Every operation runs under one lock, so appends are atomic.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    documents: BTreeMap<String, Value>,
    indexes: HashMap<String, IndexSchema>,
    leases: HashMap<String, (String, Instant)>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn document_count(&self) -> usize {
        self.state.read().await.documents.len()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.state.read().await.documents.get(key).cloned())
    }

    async fn set(&self, key: &str, path: &str, document: &Value) -> Result<(), StoreError> {
        let field = path_field(path)?;
        let mut state = self.state.write().await;

        match field {
            None => {
                state.documents.insert(key.to_string(), document.clone());
            }
            Some(field) => {
                let target = state
                    .documents
                    .get_mut(key)
                    .ok_or_else(|| StoreError::MissingDocument(key.to_string()))?;
                let object = target.as_object_mut().ok_or_else(|| StoreError::WrongType {
                    key: key.to_string(),
                    path: path.to_string(),
                    expected: "object",
                })?;
                object.insert(field.to_string(), document.clone());
            }
        }
        Ok(())
    }

    async fn arr_append(&self, key: &str, path: &str, element: &Value) -> Result<(), StoreError> {
        let field = path_field(path)?;
        let mut state = self.state.write().await;

        let document = state
            .documents
            .get_mut(key)
            .ok_or_else(|| StoreError::MissingDocument(key.to_string()))?;
        let target = match field {
            None => Some(document),
            Some(field) => document.get_mut(field),
        };

        match target.and_then(Value::as_array_mut) {
            Some(array) => {
                array.push(element.clone());
                Ok(())
            }
            None => Err(StoreError::WrongType {
                key: key.to_string(),
                path: path.to_string(),
                expected: "array",
            }),
        }
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .documents
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect())
    }

    async fn mget(&self, keys: &[String], path: &str) -> Result<Vec<Option<Value>>, StoreError> {
        let field = path_field(path)?;
        let state = self.state.read().await;

        Ok(keys
            .iter()
            .map(|key| {
                let document = state.documents.get(key)?;
                match field {
                    None => Some(document.clone()),
                    Some(field) => document.get(field).cloned(),
                }
            })
            .collect())
    }

    async fn search(
        &self,
        index: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchDocument>, StoreError> {
        let state = self.state.read().await;
        let schema = state
            .indexes
            .get(index)
            .ok_or_else(|| StoreError::Search(format!("{}: no such index", index)))?;

        let documents: Vec<SearchDocument> = state
            .documents
            .range(schema.prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&schema.prefix))
            .filter(|(_, value)| {
                query.all.iter().all(|filter| matches(schema, value, filter))
                    && (query.any.is_empty()
                        || query.any.iter().any(|filter| matches(schema, value, filter)))
            })
            .skip(query.offset)
            .take(query.limit)
            .map(|(key, value)| SearchDocument {
                id: key.clone(),
                value: value.clone(),
            })
            .collect();

        debug!("Search on {} matched {} documents", index, documents.len());
        Ok(documents)
    }

    async fn create_index(&self, schema: &IndexSchema) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state
            .indexes
            .entry(schema.name.clone())
            .or_insert_with(|| schema.clone());
        Ok(())
    }

    async fn acquire_lease(&self, key: &str, ttl: Duration) -> Result<Option<Lease>, StoreError> {
        let mut state = self.state.write().await;
        let now = Instant::now();

        if let Some((_, expires_at)) = state.leases.get(key) {
            if *expires_at > now {
                return Ok(None);
            }
        }

        let lease_id = Uuid::new_v4().to_string();
        state
            .leases
            .insert(key.to_string(), (lease_id.clone(), now + ttl));

        Ok(Some(Lease {
            key: key.to_string(),
            id: lease_id,
        }))
    }

    async fn release_lease(&self, lease: &Lease) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let held_by_us = state
            .leases
            .get(&lease.key)
            .is_some_and(|(id, _)| *id == lease.id);

        if held_by_us {
            state.leases.remove(&lease.key);
        } else {
            debug!("Lease {} on {} had already expired", lease.id, lease.key);
        }
        Ok(())
    }
}

fn matches(schema: &IndexSchema, document: &Value, filter: &FieldFilter) -> bool {
    let field = match schema
        .field_by_alias(&filter.field)
        .and_then(|field| path_field(&field.path).ok().flatten())
    {
        Some(field) => field,
        None => return false,
    };

    match document.get(field).and_then(Value::as_str) {
        // Tags compare whole, text compares per word; both ignore case like RediSearch
        Some(actual) => match filter.kind {
            FieldKind::Tag => actual.eq_ignore_ascii_case(&filter.value),
            FieldKind::Text => actual
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word.eq_ignore_ascii_case(&filter.value)),
        },
        None => false,
    }
}
