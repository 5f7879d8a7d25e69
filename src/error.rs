//! Error types for task store operations.
//!
//! Every [`TaskStoreClient`](crate::TaskStoreClient) operation returns
//! `Result<_, StoreError>`. Read failures are reported as errors instead of
//! an empty list, so callers can tell "no tasks" apart from "fetch failed".

use std::fmt;
use std::time::Duration;

use taskdeck_store::DocumentError;
use thiserror::Error;

use crate::task::TaskId;

/// The store operation an error or timeout belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Inserting a new task.
    Create,
    /// Fetching a single task.
    Get,
    /// Listing every task in the collection.
    ListAll,
    /// Listing the tasks of one owner.
    ListByOwner,
    /// Merging a patch into a task.
    Update,
    /// Removing a task.
    Delete,
}

impl Operation {
    /// Returns `true` for operations that only read.
    pub fn is_read(self) -> bool {
        matches!(self, Self::Get | Self::ListAll | Self::ListByOwner)
    }

    /// Stable lowercase name, used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::ListAll => "list_all",
            Self::ListByOwner => "list_by_owner",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`TaskStoreClient`](crate::TaskStoreClient).
///
/// # Examples
///
/// ```
/// use taskdeck::{StoreError, TaskId};
///
/// let err = StoreError::NotFound {
///     task_id: TaskId::from("abc"),
/// };
/// assert!(err.is_write());
/// assert_eq!(err.to_string(), "task not found: abc");
/// ```
#[derive(Debug, Error)]
pub enum StoreError {
    /// A list or get could not be completed.
    #[error("failed to read tasks: {source}")]
    Read {
        /// The underlying store failure.
        source: DocumentError,
    },

    /// A create, update or delete could not be completed.
    ///
    /// `task_id` is `None` for a failed create.
    #[error("failed to write task {}: {source}", describe_target(.task_id.as_ref()))]
    Write {
        /// The task being written, if it already had an id.
        task_id: Option<TaskId>,
        /// The underlying store failure.
        source: DocumentError,
    },

    /// The task does not exist, or belongs to a different owner.
    #[error("task not found: {task_id}")]
    NotFound {
        /// The requested task.
        task_id: TaskId,
    },

    /// A stored record is missing required fields or has mistyped ones.
    #[error("malformed task record {task_id}: {reason}")]
    Malformed {
        /// The offending record's id.
        task_id: TaskId,
        /// What failed to decode.
        reason: String,
    },

    /// The configured per-call deadline elapsed.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// The operation that was abandoned.
        operation: Operation,
        /// The deadline that elapsed.
        after: Duration,
    },
}

fn describe_target(task_id: Option<&TaskId>) -> &str {
    task_id.map_or("<new>", TaskId::as_str)
}

impl StoreError {
    /// Returns `true` if this error came from a read path.
    pub fn is_read(&self) -> bool {
        match self {
            Self::Read { .. } | Self::Malformed { .. } => true,
            Self::Timeout { operation, .. } => operation.is_read(),
            Self::Write { .. } | Self::NotFound { .. } => false,
        }
    }

    /// Returns `true` if this error came from a create, update or delete.
    pub fn is_write(&self) -> bool {
        !self.is_read()
    }

    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn write(task_id: Option<&TaskId>, source: DocumentError) -> Self {
        match source {
            DocumentError::NotFound { .. } => match task_id {
                Some(id) => Self::NotFound {
                    task_id: id.clone(),
                },
                None => Self::Write {
                    task_id: None,
                    source,
                },
            },
            source => Self::Write {
                task_id: task_id.cloned(),
                source,
            },
        }
    }
}
