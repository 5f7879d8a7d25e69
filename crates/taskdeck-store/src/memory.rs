//! In-memory document store.
//!
//! [`InMemoryDocumentStore`] keeps every document in a `DashMap` keyed by
//! [`DocumentKey`]. It is a dumb store with no domain logic, suitable for
//! tests and single-process use.
//!
//! # Concurrency
//!
//! `DashMap` provides shard-level locking. [`merge_update`] holds the shard
//! lock for the duration of the merge, so concurrent merges into the same
//! document never lose fields.
//!
//! [`merge_update`]: DocumentStore::merge_update

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::backend::{new_document_id, DocumentError, DocumentKey, DocumentStore};
use crate::value::{resolve_server_timestamps, Document, FieldValue, Fields};

/// Thread-safe in-memory [`DocumentStore`].
///
/// # Examples
///
/// ```
/// use taskdeck_store::InMemoryDocumentStore;
///
/// let store = InMemoryDocumentStore::new();
/// assert!(store.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    data: DashMap<DocumentKey, Fields>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents across all collections.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no documents are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn collect_where<F>(&self, collection: &str, mut keep: F) -> Vec<Document>
    where
        F: FnMut(&Fields) -> bool,
    {
        self.data
            .iter()
            .filter(|entry| entry.key().in_collection(collection))
            .filter(|entry| keep(entry.value()))
            .map(|entry| Document {
                id: entry.key().id.clone(),
                fields: entry.value().clone(),
            })
            .collect()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, collection: &str, mut fields: Fields) -> Result<String, DocumentError> {
        let id = new_document_id();
        resolve_server_timestamps(&mut fields, Utc::now());
        self.data.insert(DocumentKey::new(collection, id.as_str()), fields);
        tracing::trace!(collection, id = %id, "inserted document");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DocumentError> {
        Ok(self
            .data
            .get(&DocumentKey::new(collection, id))
            .map(|entry| Document {
                id: id.to_string(),
                fields: entry.value().clone(),
            }))
    }

    async fn query_all(&self, collection: &str) -> Result<Vec<Document>, DocumentError> {
        Ok(self.collect_where(collection, |_| true))
    }

    async fn query_where(
        &self,
        collection: &str,
        field: &str,
        value: &FieldValue,
    ) -> Result<Vec<Document>, DocumentError> {
        Ok(self.collect_where(collection, |fields| fields.get(field) == Some(value)))
    }

    async fn merge_update(
        &self,
        collection: &str,
        id: &str,
        mut fields: Fields,
    ) -> Result<(), DocumentError> {
        let mut entry = self
            .data
            .get_mut(&DocumentKey::new(collection, id))
            .ok_or_else(|| DocumentError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        resolve_server_timestamps(&mut fields, Utc::now());
        entry.value_mut().extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, DocumentError> {
        Ok(self.data.remove(&DocumentKey::new(collection, id)).is_some())
    }
}
