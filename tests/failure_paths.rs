//! Error-path tests using document stores that fail on demand.
//!
//! Read failures must surface as errors rather than empty lists, write
//! failures must reach the caller, and the board must never replace its
//! last good list with a made-up one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use taskdeck::{
    BoardError, Identity, NewTask, StoreError, TaskBoard, TaskDraft, TaskPatch, TaskStoreClient,
};
use taskdeck_store::{
    Document, DocumentError, DocumentStore, FieldValue, Fields, InMemoryDocumentStore,
};

fn due() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
}

fn outage() -> DocumentError {
    DocumentError::Unavailable {
        message: "simulated outage".to_string(),
    }
}

/// Wraps an in-memory store and fails reads or writes while the matching
/// switch is on.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryDocumentStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    fn check_read(&self) -> Result<(), DocumentError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(outage());
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), DocumentError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DocumentError::PermissionDenied {
                message: "simulated rules rejection".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, DocumentError> {
        self.check_write()?;
        self.inner.insert(collection, fields).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DocumentError> {
        self.check_read()?;
        self.inner.get(collection, id).await
    }

    async fn query_all(&self, collection: &str) -> Result<Vec<Document>, DocumentError> {
        self.check_read()?;
        self.inner.query_all(collection).await
    }

    async fn query_where(
        &self,
        collection: &str,
        field: &str,
        value: &FieldValue,
    ) -> Result<Vec<Document>, DocumentError> {
        self.check_read()?;
        self.inner.query_where(collection, field, value).await
    }

    async fn merge_update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), DocumentError> {
        self.check_write()?;
        self.inner.merge_update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, DocumentError> {
        self.check_write()?;
        self.inner.delete(collection, id).await
    }
}

fn flaky() -> (Arc<FlakyStore>, TaskStoreClient) {
    let store = Arc::new(FlakyStore::default());
    let client = TaskStoreClient::new(store.clone());
    (store, client)
}

#[tokio::test]
async fn read_failure_is_not_an_empty_list() {
    let (store, client) = flaky();
    store.fail_reads.store(true, Ordering::SeqCst);

    let err = client.list_all().await.unwrap_err();
    assert!(err.is_read());
    assert!(matches!(err, StoreError::Read { .. }));

    let err = client.list_by_owner("u1").await.unwrap_err();
    assert!(err.is_read());
}

#[tokio::test]
async fn create_failure_reaches_caller() {
    let (store, client) = flaky();
    store.fail_writes.store(true, Ordering::SeqCst);

    let err = client
        .create(NewTask::new("a", "b", "u1", due()))
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            StoreError::Write {
                task_id: None,
                source: DocumentError::PermissionDenied { .. }
            }
        ),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn update_and_delete_failures_reach_caller() {
    let (store, client) = flaky();
    let id = client
        .create(NewTask::new("a", "b", "u1", due()))
        .await
        .unwrap();
    store.fail_writes.store(true, Ordering::SeqCst);

    let err = client
        .update(&id, TaskPatch::new().with_title("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Write { task_id: Some(ref t), .. } if *t == id));

    let err = client.delete(&id).await.unwrap_err();
    assert!(err.is_write());

    store.fail_writes.store(false, Ordering::SeqCst);
    let task = client.get(&id).await.unwrap().unwrap();
    assert_eq!(task.title, "a");
}

#[tokio::test]
async fn owned_write_fails_when_ownership_cannot_be_checked() {
    let (store, client) = flaky();
    let id = client
        .create(NewTask::new("a", "b", "u1", due()))
        .await
        .unwrap();
    store.fail_reads.store(true, Ordering::SeqCst);

    let err = client.delete_owned("u1", &id).await.unwrap_err();
    assert!(matches!(err, StoreError::Read { .. }));

    store.fail_reads.store(false, Ordering::SeqCst);
    assert!(client.get(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn board_keeps_last_good_list_when_refresh_fails() {
    let (store, client) = flaky();
    let mut board = TaskBoard::new(client);
    board
        .on_identity_changed(Some(Identity::new("u1")))
        .await
        .unwrap();
    board.add(TaskDraft::new("a", "b", due())).await.unwrap();
    assert_eq!(board.tasks().len(), 1);

    store.fail_reads.store(true, Ordering::SeqCst);
    let err = board.refresh().await.unwrap_err();
    assert!(matches!(err, BoardError::Store(ref e) if e.is_read()));
    assert_eq!(board.tasks().len(), 1);
}

#[tokio::test]
async fn board_leaves_state_alone_when_write_fails() {
    let (store, client) = flaky();
    let mut board = TaskBoard::new(client);
    board
        .on_identity_changed(Some(Identity::new("u1")))
        .await
        .unwrap();
    let id = board.add(TaskDraft::new("a", "b", due())).await.unwrap();
    let before = board.tasks().to_vec();

    store.fail_writes.store(true, Ordering::SeqCst);
    assert!(board
        .edit(&id, TaskPatch::new().with_title("changed"))
        .await
        .is_err());
    assert!(board.remove(&id).await.is_err());
    assert!(board.add(TaskDraft::new("c", "d", due())).await.is_err());

    assert_eq!(board.tasks(), before.as_slice());
}

#[tokio::test]
async fn identity_change_clears_tasks_even_if_fetch_fails() {
    let (store, client) = flaky();
    let mut board = TaskBoard::new(client);
    board
        .on_identity_changed(Some(Identity::new("u1")))
        .await
        .unwrap();
    board.add(TaskDraft::new("a", "b", due())).await.unwrap();

    store.fail_reads.store(true, Ordering::SeqCst);
    let err = board
        .on_identity_changed(Some(Identity::new("u2")))
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::Store(_)));
    assert!(board.tasks().is_empty());
    assert_eq!(board.identity().map(|i| i.uid.as_str()), Some("u2"));
}

#[tokio::test]
async fn write_succeeds_even_if_resync_fails() {
    let (store, client) = flaky();
    let mut board = TaskBoard::new(client.clone());
    board
        .on_identity_changed(Some(Identity::new("u1")))
        .await
        .unwrap();

    store.fail_reads.store(true, Ordering::SeqCst);
    let id = board.add(TaskDraft::new("a", "b", due())).await.unwrap();
    assert!(board.tasks().is_empty());

    store.fail_reads.store(false, Ordering::SeqCst);
    assert!(client.get(&id).await.unwrap().is_some());
    board.refresh().await.unwrap();
    assert_eq!(board.tasks().len(), 1);
}
