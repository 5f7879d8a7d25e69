//! Identity transitions driving the task board.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use taskdeck::{
    AuthError, Identity, MockIdentityProvider, SessionManager, TaskBoard, TaskDraft,
    TaskStoreClient, TaskdeckConfig,
};
use taskdeck_store::InMemoryDocumentStore;

fn due() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
}

fn titles(board: &TaskBoard) -> Vec<&str> {
    board.tasks().iter().map(|t| t.title.as_str()).collect()
}

#[tokio::test]
async fn switching_users_never_shows_previous_users_tasks() {
    let provider = Arc::new(
        MockIdentityProvider::new()
            .with_outcome(Ok(Identity::new("alice")))
            .with_outcome(Ok(Identity::new("bob"))),
    );
    let session = SessionManager::new(provider);
    let client = TaskStoreClient::new(Arc::new(InMemoryDocumentStore::new()));
    let mut board = TaskBoard::new(client.clone());

    board.on_identity_changed(session.sign_in().await).await.unwrap();
    board
        .add(TaskDraft::new("alice's task", "private", due()))
        .await
        .unwrap();
    assert_eq!(titles(&board), vec!["alice's task"]);

    session.sign_out().await;
    board.on_identity_changed(session.current()).await.unwrap();
    assert!(board.tasks().is_empty());

    board.on_identity_changed(session.sign_in().await).await.unwrap();
    assert!(board.tasks().is_empty());
    assert!(client.list_by_owner("bob").await.unwrap().is_empty());

    board
        .add(TaskDraft::new("bob's task", "mine", due()))
        .await
        .unwrap();
    assert_eq!(titles(&board), vec!["bob's task"]);
    assert!(client
        .list_by_owner("bob")
        .await
        .unwrap()
        .iter()
        .all(|t| t.owner_id == "bob"));
}

#[tokio::test]
async fn failed_sign_in_leaves_board_signed_out() {
    let provider = Arc::new(MockIdentityProvider::new().with_outcome(Err(AuthError::Network {
        message: "offline".to_string(),
    })));
    let session = SessionManager::new(provider);
    let mut board = TaskBoard::new(TaskStoreClient::new(Arc::new(
        InMemoryDocumentStore::new(),
    )));

    board.on_identity_changed(session.sign_in().await).await.unwrap();
    assert!(board.identity().is_none());
    assert!(board.add(TaskDraft::new("a", "b", due())).await.is_err());
}

#[tokio::test]
async fn board_follows_watch_channel() {
    let provider = Arc::new(MockIdentityProvider::new());
    let session = SessionManager::new(provider.clone());
    let client = TaskStoreClient::new(Arc::new(InMemoryDocumentStore::new()));
    let mut board = TaskBoard::new(client.clone());

    let mut rx = session.watch();
    let current = rx.borrow_and_update().clone();
    board.on_identity_changed(current).await.unwrap();
    assert!(board.identity().is_none());

    // A session restored outside this process, for example from another tab.
    provider.set_identity(Some(Identity::new("u1")));
    tokio::time::timeout(Duration::from_secs(1), rx.changed())
        .await
        .unwrap()
        .unwrap();
    let current = rx.borrow_and_update().clone();
    board.on_identity_changed(current).await.unwrap();
    assert_eq!(board.identity().map(|i| i.uid.as_str()), Some("u1"));

    board.add(TaskDraft::new("a", "b", due())).await.unwrap();
    assert_eq!(board.tasks().len(), 1);

    // Session expiry.
    provider.set_identity(None);
    rx.changed().await.unwrap();
    let current = rx.borrow_and_update().clone();
    board.on_identity_changed(current).await.unwrap();
    assert!(board.tasks().is_empty());
}

#[tokio::test]
async fn subscription_reports_each_transition_once() {
    let provider = Arc::new(
        MockIdentityProvider::new()
            .with_outcome(Ok(Identity::new("u1")))
            .with_outcome(Ok(Identity::new("u1"))),
    );
    let session = SessionManager::new(provider.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sub = session.subscribe(move |identity: Option<Identity>| {
        let _ = tx.send(identity.map(|i| i.uid));
    });

    let mut seen = Vec::new();
    seen.push(rx.recv().await.unwrap());

    session.sign_in().await;
    seen.push(rx.recv().await.unwrap());

    // Signing in again as the same user is not a transition.
    session.sign_in().await;
    session.sign_out().await;
    seen.push(rx.recv().await.unwrap());

    assert_eq!(seen, vec![None, Some("u1".to_string()), None]);
    sub.unsubscribe();
}

#[tokio::test]
async fn config_identity_signs_in_locally() {
    let config = TaskdeckConfig::from_toml_str(
        r#"
        [identity]
        uid = "local"
        display_name = "Local User"
        "#,
    )
    .unwrap();
    let provider = config.identity_provider().unwrap();
    let session = SessionManager::new(Arc::new(provider));
    let mut board = TaskBoard::new(config.connect().await.unwrap());

    let identity = session.sign_in().await.unwrap();
    assert_eq!(identity.name(), "Local User");
    board.on_identity_changed(Some(identity)).await.unwrap();
    board.add(TaskDraft::new("a", "b", due())).await.unwrap();
    assert_eq!(board.tasks()[0].owner_id, "local");
}
