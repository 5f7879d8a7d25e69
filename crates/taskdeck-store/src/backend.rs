//! The document store contract and its error type.
//!
//! [`DocumentStore`] exposes six operations over named collections:
//! [`insert`](DocumentStore::insert), [`get`](DocumentStore::get),
//! [`query_all`](DocumentStore::query_all),
//! [`query_where`](DocumentStore::query_where),
//! [`merge_update`](DocumentStore::merge_update) and
//! [`delete`](DocumentStore::delete).
//!
//! Domain logic (validation, ownership checks, record decoding) does **not**
//! belong here. Backends store and return field maps verbatim, except for
//! resolving [`FieldValue::ServerTimestamp`](crate::FieldValue::ServerTimestamp)
//! sentinels and assigning ids.
//!
//! # Key Structure
//!
//! Documents are addressed by [`DocumentKey`], a `(collection, id)` pair.
//! Collection names are opaque strings; ids are `UUIDv4` strings.

use std::fmt;

use async_trait::async_trait;

use crate::value::{Document, FieldValue, Fields};

/// Errors raised by a [`DocumentStore`].
///
/// # Examples
///
/// ```
/// use taskdeck_store::DocumentError;
///
/// let err = DocumentError::NotFound {
///     collection: "tasks".to_string(),
///     id: "abc".to_string(),
/// };
/// assert_eq!(err.to_string(), "document not found: tasks/abc");
/// ```
#[derive(Debug)]
pub enum DocumentError {
    /// No document with the given id exists in the collection.
    NotFound {
        /// Collection that was searched.
        collection: String,
        /// The missing document id.
        id: String,
    },

    /// The backend refused the operation (credentials, ACLs).
    PermissionDenied {
        /// Human-readable description from the backend.
        message: String,
    },

    /// The backend could not be reached (network failure, timeout, shutdown).
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
    },

    /// A stored payload could not be encoded or decoded.
    Serialization {
        /// Human-readable description of the failure.
        message: String,
    },

    /// Any other backend-specific failure.
    Backend {
        /// Human-readable description of the error.
        message: String,
        /// The underlying error, if available. Accessible via
        /// [`std::error::Error::source()`].
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DocumentError {
    /// Builds a [`DocumentError::Backend`] without an underlying source.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` for [`DocumentError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { collection, id } => {
                write!(f, "document not found: {collection}/{id}")
            },
            Self::PermissionDenied { message } => write!(f, "permission denied: {message}"),
            Self::Unavailable { message } => write!(f, "store unavailable: {message}"),
            Self::Serialization { message } => write!(f, "serialization error: {message}"),
            Self::Backend { message, .. } => write!(f, "backend error: {message}"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend {
                source: Some(src), ..
            } => Some(src.as_ref()),
            _ => None,
        }
    }
}

/// A collection-oriented document store.
///
/// Every call is one independent round-trip: there are no sessions,
/// transactions or multi-step protocols. Implementations must be
/// `Send + Sync` so a single store can be shared behind an `Arc`.
///
/// # No Domain Logic
///
/// Backends must never validate field contents or check ownership. They
/// resolve server timestamps, assign ids and otherwise store what they are
/// given.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document and returns its freshly assigned id.
    ///
    /// [`FieldValue::ServerTimestamp`] sentinels are resolved to the
    /// backend's clock before the write.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::PermissionDenied`] if the backend rejects the write.
    /// - [`DocumentError::Unavailable`] / [`DocumentError::Backend`] on I/O failures.
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, DocumentError>;

    /// Fetches a single document. Returns `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::Unavailable`] / [`DocumentError::Backend`] on I/O failures.
    /// - [`DocumentError::Serialization`] if the stored payload is unreadable.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DocumentError>;

    /// Returns every document in the collection, in unspecified order.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::Unavailable`] / [`DocumentError::Backend`] on I/O failures.
    async fn query_all(&self, collection: &str) -> Result<Vec<Document>, DocumentError>;

    /// Returns the documents whose `field` equals `value`, in unspecified order.
    ///
    /// Documents missing the field never match.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::Unavailable`] / [`DocumentError::Backend`] on I/O failures.
    async fn query_where(
        &self,
        collection: &str,
        field: &str,
        value: &FieldValue,
    ) -> Result<Vec<Document>, DocumentError>;

    /// Merges `fields` into an existing document.
    ///
    /// Each given field overwrites the stored one; fields not present in
    /// `fields` are left untouched.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::NotFound`] if the document does not exist.
    /// - [`DocumentError::Unavailable`] / [`DocumentError::Backend`] on I/O failures.
    async fn merge_update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), DocumentError>;

    /// Deletes a document.
    ///
    /// Returns `true` if it existed, `false` if it was already absent.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::Unavailable`] / [`DocumentError::Backend`] on I/O failures.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, DocumentError>;
}

/// Address of one document: `(collection, id)`.
///
/// Backends keep the two parts separate, so a collection name may contain any
/// character without colliding with another collection's documents.
///
/// # Examples
///
/// ```
/// use taskdeck_store::backend::DocumentKey;
///
/// let key = DocumentKey::new("tasks", "abc");
/// assert_eq!(key.to_string(), "tasks/abc");
/// assert!(key.in_collection("tasks"));
/// assert!(!DocumentKey::new("tasks/archive", "abc").in_collection("tasks"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    /// Collection name.
    pub collection: String,
    /// Document id within the collection.
    pub id: String,
}

impl DocumentKey {
    /// Builds a key.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Returns `true` if the document belongs to exactly `collection`.
    pub fn in_collection(&self, collection: &str) -> bool {
        self.collection == collection
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Generates a fresh document id.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
