//! Task store client.
//!
//! [`TaskStoreClient`] wraps a [`DocumentStore`] collection of task records.
//! It holds no state between calls: every operation is one independent round
//! trip and returns `Result<_, StoreError>`.
//!
//! # Ownership
//!
//! [`update`](TaskStoreClient::update) and [`delete`](TaskStoreClient::delete)
//! do not check who owns the task. [`update_owned`](TaskStoreClient::update_owned)
//! and [`delete_owned`](TaskStoreClient::delete_owned) verify the stored owner
//! first. An owner mismatch returns [`StoreError::NotFound`], so a caller can
//! never learn that a task exists for a different owner.
//!
//! # Timeouts
//!
//! With [`with_timeout`](TaskStoreClient::with_timeout) every call is bounded
//! by a deadline and yields [`StoreError::Timeout`] once it elapses.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use taskdeck_store::{Document, DocumentStore, FieldValue};

use crate::error::{Operation, StoreError};
use crate::task::{fields, NewTask, Task, TaskId, TaskPatch};

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "tasks";

/// Client for the task collection of a [`DocumentStore`].
///
/// Cloning is cheap; clones share the underlying store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chrono::NaiveDate;
/// use taskdeck::{NewTask, TaskStoreClient};
/// use taskdeck_store::InMemoryDocumentStore;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let client = TaskStoreClient::new(Arc::new(InMemoryDocumentStore::new()));
/// let due = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
///
/// let id = client.create(NewTask::new("Buy milk", "2%", "u1", due)).await.unwrap();
/// let tasks = client.list_by_owner("u1").await.unwrap();
/// assert_eq!(tasks.len(), 1);
/// assert_eq!(tasks[0].id, id);
/// assert!(!tasks[0].completed);
/// # });
/// ```
#[derive(Clone)]
pub struct TaskStoreClient {
    store: Arc<dyn DocumentStore>,
    collection: String,
    timeout: Option<Duration>,
}

impl fmt::Debug for TaskStoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStoreClient")
            .field("collection", &self.collection)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TaskStoreClient {
    /// Creates a client over the `"tasks"` collection with no deadline.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            collection: DEFAULT_COLLECTION.to_string(),
            timeout: None,
        }
    }

    /// Uses a different collection name.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Bounds every call by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the per-call deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn bounded<T, F>(&self, operation: Operation, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match self.timeout {
            Some(after) => tokio::time::timeout(after, fut).await.unwrap_or_else(|_| {
                tracing::warn!(%operation, ?after, "task store call timed out");
                Err(StoreError::Timeout { operation, after })
            }),
            None => fut.await,
        }
    }

    fn decode_all(&self, docs: Vec<Document>) -> Vec<Task> {
        docs.iter()
            .filter_map(|doc| match Task::from_document(doc) {
                Ok(task) => Some(task),
                Err(reason) => {
                    tracing::warn!(
                        collection = %self.collection,
                        task_id = %doc.id,
                        %reason,
                        "skipping malformed task record"
                    );
                    None
                },
            })
            .collect()
    }

    /// Persists a new task and returns its store-assigned id.
    ///
    /// The record starts with `completed = false` and a `createdAt` taken
    /// from the store's clock. Two identical calls create two tasks.
    ///
    /// # Errors
    ///
    /// [`StoreError::Write`] if the insert fails.
    #[tracing::instrument(skip(self, task), fields(owner_id = %task.owner_id))]
    pub async fn create(&self, task: NewTask) -> Result<TaskId, StoreError> {
        let record = task.into_fields();
        let id = self
            .bounded(Operation::Create, async {
                self.store
                    .insert(&self.collection, record)
                    .await
                    .map_err(|source| StoreError::write(None, source))
            })
            .await?;
        tracing::debug!(task_id = %id, "created task");
        Ok(TaskId::from(id))
    }

    /// Fetches one task. Returns `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Read`] if the fetch fails.
    /// - [`StoreError::Malformed`] if the stored record cannot be decoded.
    #[tracing::instrument(skip(self), fields(task_id = %id))]
    pub async fn get(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        let doc = self
            .bounded(Operation::Get, async {
                self.store
                    .get(&self.collection, id.as_str())
                    .await
                    .map_err(|source| StoreError::Read { source })
            })
            .await?;

        doc.map(|doc| {
            Task::from_document(&doc).map_err(|reason| StoreError::Malformed {
                task_id: id.clone(),
                reason,
            })
        })
        .transpose()
    }

    /// Lists every task in the collection, in unspecified order.
    ///
    /// Undecodable records are skipped and logged.
    ///
    /// # Errors
    ///
    /// [`StoreError::Read`] if the query fails. An empty `Ok` always means
    /// the collection has no readable tasks.
    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Task>, StoreError> {
        let docs = self
            .bounded(Operation::ListAll, async {
                self.store
                    .query_all(&self.collection)
                    .await
                    .map_err(|source| StoreError::Read { source })
            })
            .await?;
        let tasks = self.decode_all(docs);
        tracing::debug!(count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    /// Lists the tasks whose owner is `owner_id`, in unspecified order.
    ///
    /// # Errors
    ///
    /// [`StoreError::Read`] if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Task>, StoreError> {
        let owner = FieldValue::from(owner_id);
        let docs = self
            .bounded(Operation::ListByOwner, async {
                self.store
                    .query_where(&self.collection, fields::OWNER_ID, &owner)
                    .await
                    .map_err(|source| StoreError::Read { source })
            })
            .await?;

        // The store filters, but a result for a foreign owner must never leak.
        let tasks: Vec<Task> = self
            .decode_all(docs)
            .into_iter()
            .filter(|task| task.owner_id == owner_id)
            .collect();
        tracing::debug!(count = tasks.len(), "listed owner tasks");
        Ok(tasks)
    }

    /// Merges `patch` into an existing task.
    ///
    /// Fields not set in the patch keep their stored values.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the task does not exist.
    /// - [`StoreError::Write`] if the merge fails.
    #[tracing::instrument(skip(self, patch), fields(task_id = %id))]
    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<(), StoreError> {
        let changes = patch.into_fields();
        self.bounded(Operation::Update, async {
            self.store
                .merge_update(&self.collection, id.as_str(), changes)
                .await
                .map_err(|source| StoreError::write(Some(id), source))
        })
        .await?;
        tracing::debug!("updated task");
        Ok(())
    }

    /// Removes a task. Removing an absent task succeeds.
    ///
    /// # Errors
    ///
    /// [`StoreError::Write`] if the delete fails.
    #[tracing::instrument(skip(self), fields(task_id = %id))]
    pub async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        let existed = self
            .bounded(Operation::Delete, async {
                self.store
                    .delete(&self.collection, id.as_str())
                    .await
                    .map_err(|source| StoreError::write(Some(id), source))
            })
            .await?;
        tracing::debug!(existed, "deleted task");
        Ok(())
    }

    /// Loads a task and checks that `owner_id` owns it.
    async fn owned(&self, owner_id: &str, id: &TaskId) -> Result<Task, StoreError> {
        let task = self.get(id).await?.ok_or_else(|| StoreError::NotFound {
            task_id: id.clone(),
        })?;

        if task.owner_id != owner_id {
            tracing::warn!(
                task_id = %id,
                expected_owner = owner_id,
                actual_owner = %task.owner_id,
                "owner mismatch on task write (returning NotFound)"
            );
            return Err(StoreError::NotFound {
                task_id: id.clone(),
            });
        }
        Ok(task)
    }

    /// Like [`update`](Self::update), but only if `owner_id` owns the task.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the task is absent or owned by someone else.
    /// - [`StoreError::Read`] / [`StoreError::Malformed`] if the ownership check fails.
    /// - [`StoreError::Write`] if the merge fails.
    pub async fn update_owned(
        &self,
        owner_id: &str,
        id: &TaskId,
        patch: TaskPatch,
    ) -> Result<(), StoreError> {
        self.owned(owner_id, id).await?;
        self.update(id, patch).await
    }

    /// Like [`delete`](Self::delete), but only if `owner_id` owns the task.
    ///
    /// Unlike the plain variant, an absent task is reported as
    /// [`StoreError::NotFound`]: answering `Ok` for absent tasks but not for
    /// foreign ones would reveal which ids exist.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the task is absent or owned by someone else.
    /// - [`StoreError::Read`] / [`StoreError::Malformed`] if the ownership check fails.
    /// - [`StoreError::Write`] if the delete fails.
    pub async fn delete_owned(&self, owner_id: &str, id: &TaskId) -> Result<(), StoreError> {
        self.owned(owner_id, id).await?;
        self.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use pretty_assertions::assert_eq;
    use taskdeck_store::{DocumentError, Fields, InMemoryDocumentStore};

    fn due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn client() -> (Arc<InMemoryDocumentStore>, TaskStoreClient) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let client = TaskStoreClient::new(store.clone());
        (store, client)
    }

    #[tokio::test]
    async fn create_sets_defaults() {
        let (_, client) = client();
        let before = Utc::now();
        let id = client
            .create(NewTask::new("Buy milk", "2%", "u1", due()))
            .await
            .unwrap();
        assert!(!id.as_str().is_empty());

        let task = client.get(&id).await.unwrap().unwrap();
        assert!(!task.completed);
        assert!(task.created_at >= before);
        assert_eq!(task.due_date, Some(due()));
        assert_eq!(task.owner_id, "u1");
    }

    #[tokio::test]
    async fn update_leaves_other_fields_alone() {
        let (_, client) = client();
        let id = client
            .create(NewTask::new("Buy milk", "2%", "u1", due()))
            .await
            .unwrap();
        let before = client.get(&id).await.unwrap().unwrap();

        client
            .update(&id, TaskPatch::new().with_title("Buy oat milk"))
            .await
            .unwrap();

        let after = client.get(&id).await.unwrap().unwrap();
        assert_eq!(
            after,
            Task {
                title: "Buy oat milk".to_string(),
                ..before
            }
        );
    }

    #[tokio::test]
    async fn update_missing_task_is_not_found() {
        let (_, client) = client();
        let err = client
            .update(&TaskId::from("ghost"), TaskPatch::new().with_title("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn delete_twice_succeeds() {
        let (_, client) = client();
        let id = client
            .create(NewTask::new("a", "b", "u1", due()))
            .await
            .unwrap();
        client.delete(&id).await.unwrap();
        client.delete(&id).await.unwrap();
        assert!(client.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_records_are_skipped_on_list_and_reported_on_get() {
        let (store, client) = client();
        client
            .create(NewTask::new("good", "b", "u1", due()))
            .await
            .unwrap();
        let mut broken = Fields::new();
        broken.insert(fields::OWNER_ID.to_string(), FieldValue::from("u1"));
        let bad = store.insert("tasks", broken).await.unwrap();

        let tasks = client.list_by_owner("u1").await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "good");

        let err = client.get(&TaskId::from(bad)).await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn owned_variants_hide_foreign_tasks() {
        let (_, client) = client();
        let id = client
            .create(NewTask::new("mine", "b", "u1", due()))
            .await
            .unwrap();

        let err = client
            .update_owned("u2", &id, TaskPatch::new().with_title("stolen"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        let err = client.delete_owned("u2", &id).await.unwrap_err();
        assert!(err.is_not_found());

        let task = client.get(&id).await.unwrap().unwrap();
        assert_eq!(task.title, "mine");

        client
            .update_owned("u1", &id, TaskPatch::new().with_title("still mine"))
            .await
            .unwrap();
        client.delete_owned("u1", &id).await.unwrap();
        assert!(client.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn custom_collection_is_used() {
        let (store, client) = client();
        let client = client.with_collection("chores");
        client
            .create(NewTask::new("a", "b", "u1", due()))
            .await
            .unwrap();
        assert!(store.query_all("tasks").await.unwrap().is_empty());
        assert_eq!(store.query_all("chores").await.unwrap().len(), 1);
    }

    /// Store whose calls never complete.
    struct HangingStore;

    #[async_trait]
    impl DocumentStore for HangingStore {
        async fn insert(&self, _: &str, _: Fields) -> Result<String, DocumentError> {
            std::future::pending().await
        }
        async fn get(&self, _: &str, _: &str) -> Result<Option<Document>, DocumentError> {
            std::future::pending().await
        }
        async fn query_all(&self, _: &str) -> Result<Vec<Document>, DocumentError> {
            std::future::pending().await
        }
        async fn query_where(
            &self,
            _: &str,
            _: &str,
            _: &FieldValue,
        ) -> Result<Vec<Document>, DocumentError> {
            std::future::pending().await
        }
        async fn merge_update(&self, _: &str, _: &str, _: Fields) -> Result<(), DocumentError> {
            std::future::pending().await
        }
        async fn delete(&self, _: &str, _: &str) -> Result<bool, DocumentError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_calls_time_out() {
        let client =
            TaskStoreClient::new(Arc::new(HangingStore)).with_timeout(Duration::from_millis(50));

        let err = client.list_all().await.unwrap_err();
        assert!(
            matches!(
                err,
                StoreError::Timeout {
                    operation: Operation::ListAll,
                    ..
                }
            ),
            "got: {err}"
        );
        assert!(err.is_read());

        let err = client
            .create(NewTask::new("a", "b", "u1", due()))
            .await
            .unwrap_err();
        assert!(err.is_write());
    }
}
