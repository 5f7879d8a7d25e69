//! Local mirror of the signed-in user's tasks.
//!
//! [`TaskBoard`] is the controller side of the sync contract. It holds the
//! current identity and the last task list fetched for it, and resynchronizes
//! by re-fetching after every successful mutation and identity change.
//!
//! Failures never leave the mirror in a made-up state: a failed fetch keeps
//! the last good list, and a failed write leaves local tasks untouched.

use chrono::NaiveDate;
use thiserror::Error;

use crate::client::TaskStoreClient;
use crate::error::StoreError;
use crate::session::Identity;
use crate::task::{NewTask, Task, TaskId, TaskPatch};

/// Errors returned by [`TaskBoard`] operations.
#[derive(Debug, Error)]
pub enum BoardError {
    /// The operation needs a signed-in identity.
    #[error("no identity is signed in")]
    NotSignedIn,

    /// The input was rejected before reaching the store.
    #[error("invalid task: {0}")]
    Validation(String),

    /// The store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// User input for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Short title. Must not be blank.
    pub title: String,
    /// Free text. Must not be blank.
    pub description: String,
    /// Due date.
    pub due_date: NaiveDate,
}

impl TaskDraft {
    /// Creates a draft.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            due_date,
        }
    }

    /// Checks that title and description are non-blank and returns them
    /// trimmed.
    ///
    /// # Errors
    ///
    /// [`BoardError::Validation`] naming the first blank field.
    pub fn validate(&self) -> Result<(String, String), BoardError> {
        let title = non_blank(&self.title, "title")?;
        let description = non_blank(&self.description, "description")?;
        Ok((title, description))
    }
}

fn non_blank(value: &str, field: &str) -> Result<String, BoardError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// The signed-in user's tasks, kept in step with the store.
///
/// Tasks are held sorted by creation time, oldest first.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use chrono::NaiveDate;
/// use taskdeck::{Identity, TaskBoard, TaskDraft, TaskStoreClient};
/// use taskdeck_store::InMemoryDocumentStore;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let client = TaskStoreClient::new(Arc::new(InMemoryDocumentStore::new()));
/// let mut board = TaskBoard::new(client);
///
/// board.on_identity_changed(Some(Identity::new("u1"))).await.unwrap();
/// let due = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
/// board.add(TaskDraft::new("Buy milk", "2%", due)).await.unwrap();
/// assert_eq!(board.tasks().len(), 1);
///
/// board.on_identity_changed(None).await.unwrap();
/// assert!(board.tasks().is_empty());
/// # });
/// ```
#[derive(Debug)]
pub struct TaskBoard {
    client: TaskStoreClient,
    identity: Option<Identity>,
    tasks: Vec<Task>,
}

impl TaskBoard {
    /// Creates an empty, signed-out board.
    pub fn new(client: TaskStoreClient) -> Self {
        Self {
            client,
            identity: None,
            tasks: Vec::new(),
        }
    }

    /// The identity the board is showing tasks for.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// The last successfully fetched tasks.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The underlying store client.
    pub fn client(&self) -> &TaskStoreClient {
        &self.client
    }

    /// Switches to `identity`.
    ///
    /// Local tasks are cleared first, so the previous identity's tasks are
    /// never shown for the new one, even if the fetch then fails.
    ///
    /// # Errors
    ///
    /// [`BoardError::Store`] if fetching the new identity's tasks fails.
    pub async fn on_identity_changed(
        &mut self,
        identity: Option<Identity>,
    ) -> Result<(), BoardError> {
        tracing::debug!(
            uid = identity.as_ref().map(|id| id.uid.as_str()),
            "identity changed"
        );
        self.tasks.clear();
        self.identity = identity;
        if self.identity.is_some() {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Re-fetches the current identity's tasks.
    ///
    /// Signed out, this clears the board.
    ///
    /// # Errors
    ///
    /// [`BoardError::Store`] if the fetch fails; the previous list is kept.
    pub async fn refresh(&mut self) -> Result<&[Task], BoardError> {
        let Some(identity) = &self.identity else {
            self.tasks.clear();
            return Ok(&self.tasks);
        };

        let mut tasks = self.client.list_by_owner(&identity.uid).await?;
        tasks.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        self.tasks = tasks;
        Ok(&self.tasks)
    }

    /// Refreshes after a successful write. A failure here is logged, not
    /// returned: the write itself went through.
    async fn resync(&mut self) {
        if let Err(err) = self.refresh().await {
            tracing::warn!(error = %err, "re-fetch after write failed; keeping previous tasks");
        }
    }

    fn owner(&self) -> Result<String, BoardError> {
        self.identity
            .as_ref()
            .map(|id| id.uid.clone())
            .ok_or(BoardError::NotSignedIn)
    }

    /// Validates `draft`, creates it for the signed-in identity and
    /// re-fetches.
    ///
    /// # Errors
    ///
    /// - [`BoardError::NotSignedIn`] without an identity.
    /// - [`BoardError::Validation`] for a blank title or description.
    /// - [`BoardError::Store`] if the create fails.
    pub async fn add(&mut self, draft: TaskDraft) -> Result<TaskId, BoardError> {
        let owner = self.owner()?;
        let (title, description) = draft.validate()?;

        let id = self
            .client
            .create(NewTask::new(title, description, owner, draft.due_date))
            .await?;
        self.resync().await;
        Ok(id)
    }

    /// Applies `patch` to one of the signed-in identity's tasks and
    /// re-fetches.
    ///
    /// # Errors
    ///
    /// - [`BoardError::NotSignedIn`] without an identity.
    /// - [`BoardError::Validation`] if the patch blanks the title or description.
    /// - [`BoardError::Store`] if the task is missing, foreign, or the write fails.
    pub async fn edit(&mut self, id: &TaskId, patch: TaskPatch) -> Result<(), BoardError> {
        let owner = self.owner()?;
        let patch = TaskPatch {
            title: patch
                .title
                .map(|t| non_blank(&t, "title"))
                .transpose()?,
            description: patch
                .description
                .map(|d| non_blank(&d, "description"))
                .transpose()?,
            due_date: patch.due_date,
        };

        self.client.update_owned(&owner, id, patch).await?;
        self.resync().await;
        Ok(())
    }

    /// Deletes one of the signed-in identity's tasks and re-fetches.
    ///
    /// # Errors
    ///
    /// - [`BoardError::NotSignedIn`] without an identity.
    /// - [`BoardError::Store`] if the task is missing, foreign, or the delete fails.
    pub async fn remove(&mut self, id: &TaskId) -> Result<(), BoardError> {
        let owner = self.owner()?;
        self.client.delete_owned(&owner, id).await?;
        self.resync().await;
        Ok(())
    }
}
