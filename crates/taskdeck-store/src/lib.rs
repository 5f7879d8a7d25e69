//! Document store boundary for taskdeck.
//!
//! A document store holds flat collections of records. Each record is a map
//! from field name to [`FieldValue`], addressed by a store-assigned id. This
//! crate defines that contract and ships the backends that satisfy it.
//!
//! # Module Organization
//!
//! - [`value`] - Field values, field maps and stored documents
//! - [`backend`] - The [`DocumentStore`] trait and [`DocumentError`]
//! - [`memory`] - Thread-safe in-memory backend
//! - `redis` - Redis backend (behind the `redis` feature)
//!
//! # Examples
//!
//! ```
//! use taskdeck_store::{DocumentStore, Fields, FieldValue, InMemoryDocumentStore};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = InMemoryDocumentStore::new();
//!
//! let mut fields = Fields::new();
//! fields.insert("title".to_string(), FieldValue::from("Buy milk"));
//! fields.insert("createdAt".to_string(), FieldValue::ServerTimestamp);
//!
//! let id = store.insert("tasks", fields).await.unwrap();
//! let doc = store.get("tasks", &id).await.unwrap().unwrap();
//! assert_eq!(doc.fields["title"].as_str(), Some("Buy milk"));
//! assert!(doc.fields["createdAt"].as_timestamp().is_some());
//! # });
//! ```

pub mod backend;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod value;

pub use backend::{DocumentError, DocumentKey, DocumentStore};
pub use memory::InMemoryDocumentStore;
pub use value::{Document, FieldValue, Fields};
