//! Redis document store.
//!
//! [`RedisDocumentStore`] maps each collection to one Redis hash. The hash
//! field is the document id and the value is the JSON-encoded field map.
//!
//! # Key Schema
//!
//! | Key Pattern | Type | Purpose |
//! |-------------|------|---------|
//! | `{prefix}:{collection}` | Hash | `id -> JSON(Fields)` |
//!
//! Merges run as a Lua script so read-modify-write happens in one atomic
//! round-trip. Server timestamps are resolved client-side (in this process)
//! before the payload is sent.
//!
//! Equality queries fetch the whole hash and filter locally.
//!
//! # Usage
//!
//! ```rust,no_run
//! use taskdeck_store::redis::RedisDocumentStore;
//!
//! # async fn example() {
//! let store = RedisDocumentStore::new("redis://127.0.0.1:6379")
//!     .await
//!     .unwrap()
//!     .with_prefix("my-app");
//! # }
//! ```

use std::collections::HashMap;

use ::redis::aio::MultiplexedConnection;
use ::redis::{AsyncCommands, Script};
use async_trait::async_trait;
use chrono::Utc;

use crate::backend::{new_document_id, DocumentError, DocumentStore};
use crate::value::{resolve_server_timestamps, Document, FieldValue, Fields};

/// Merge: decode stored JSON, overlay the patch, write back.
///
/// KEYS[1] = collection hash key.
/// ARGV[1] = document id, ARGV[2] = patch JSON object.
/// Returns: 1 on success, 0 if the document does not exist.
const LUA_MERGE: &str = r#"
local current = redis.call('HGET', KEYS[1], ARGV[1])
if not current then
    return 0
end

local doc = cjson.decode(current)
local patch = cjson.decode(ARGV[2])
for k, v in pairs(patch) do
    doc[k] = v
end

redis.call('HSET', KEYS[1], ARGV[1], cjson.encode(doc))
return 1
"#;

/// Redis-backed [`DocumentStore`].
///
/// Holds a [`MultiplexedConnection`], which is cheap to clone; every method
/// clones it so calls can run concurrently over one TCP connection.
#[derive(Debug, Clone)]
pub struct RedisDocumentStore {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisDocumentStore {
    /// Connects to Redis at `url` (`redis://[:<password>@]<host>:<port>[/<db>]`).
    ///
    /// Uses the default key prefix `"taskdeck"`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Unavailable`] if the client cannot be created or
    /// the connection cannot be established.
    pub async fn new(url: &str) -> Result<Self, DocumentError> {
        let client = ::redis::Client::open(url).map_err(|e| DocumentError::Unavailable {
            message: format!("failed to create Redis client: {e}"),
        })?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| DocumentError::Unavailable {
                message: format!("failed to connect to Redis: {e}"),
            })?;
        Ok(Self::with_connection(conn))
    }

    /// Wraps an existing multiplexed connection.
    pub fn with_connection(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: "taskdeck".to_string(),
        }
    }

    /// Sets a custom key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    fn collection_key(&self, collection: &str) -> String {
        format!("{}:{}", self.key_prefix, collection)
    }
}

fn map_redis_error(err: ::redis::RedisError, context: &str) -> DocumentError {
    DocumentError::Backend {
        message: format!("Redis error during {context}: {err}"),
        source: Some(Box::new(err)),
    }
}

fn encode(fields: &Fields) -> Result<String, DocumentError> {
    serde_json::to_string(fields).map_err(|e| DocumentError::Serialization {
        message: format!("failed to encode fields: {e}"),
    })
}

fn decode(id: &str, raw: &str) -> Result<Document, DocumentError> {
    let fields: Fields = serde_json::from_str(raw).map_err(|e| DocumentError::Serialization {
        message: format!("failed to decode document {id}: {e}"),
    })?;
    Ok(Document {
        id: id.to_string(),
        fields,
    })
}

impl RedisDocumentStore {
    async fn fetch_collection(&self, collection: &str) -> Result<Vec<Document>, DocumentError> {
        let key = self.collection_key(collection);
        let mut conn = self.conn.clone();
        let raw: HashMap<String, String> = conn
            .hgetall(&key)
            .await
            .map_err(|e| map_redis_error(e, "HGETALL"))?;

        let mut docs = Vec::with_capacity(raw.len());
        for (id, payload) in raw {
            match decode(&id, &payload) {
                Ok(doc) => docs.push(doc),
                Err(err) => {
                    tracing::warn!(collection, id = %id, error = %err, "skipping unreadable document");
                },
            }
        }
        Ok(docs)
    }
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    async fn insert(&self, collection: &str, mut fields: Fields) -> Result<String, DocumentError> {
        let id = new_document_id();
        resolve_server_timestamps(&mut fields, Utc::now());
        let payload = encode(&fields)?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(self.collection_key(collection), &id, payload)
            .await
            .map_err(|e| map_redis_error(e, "HSET"))?;
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DocumentError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .hget(self.collection_key(collection), id)
            .await
            .map_err(|e| map_redis_error(e, "HGET"))?;
        raw.map(|payload| decode(id, &payload)).transpose()
    }

    async fn query_all(&self, collection: &str) -> Result<Vec<Document>, DocumentError> {
        self.fetch_collection(collection).await
    }

    async fn query_where(
        &self,
        collection: &str,
        field: &str,
        value: &FieldValue,
    ) -> Result<Vec<Document>, DocumentError> {
        let docs = self.fetch_collection(collection).await?;
        Ok(docs
            .into_iter()
            .filter(|doc| doc.fields.get(field) == Some(value))
            .collect())
    }

    async fn merge_update(
        &self,
        collection: &str,
        id: &str,
        mut fields: Fields,
    ) -> Result<(), DocumentError> {
        resolve_server_timestamps(&mut fields, Utc::now());
        let patch = encode(&fields)?;

        let merged: i64 = Script::new(LUA_MERGE)
            .key(self.collection_key(collection))
            .arg(id)
            .arg(patch)
            .invoke_async(&mut self.conn.clone())
            .await
            .map_err(|e| map_redis_error(e, "merge script"))?;

        if merged == 0 {
            return Err(DocumentError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, DocumentError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .hdel(self.collection_key(collection), id)
            .await
            .map_err(|e| map_redis_error(e, "HDEL"))?;
        Ok(removed > 0)
    }
}
