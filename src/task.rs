//! Task domain types and their document encoding.
//!
//! A [`Task`] is stored as a flat document with the fields listed in
//! [`fields`]. Due dates have date granularity and are stored as a timestamp
//! at midnight UTC.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use taskdeck_store::{Document, FieldValue, Fields};

/// Document field names.
pub mod fields {
    /// Task title (string).
    pub const TITLE: &str = "title";
    /// Task description (string).
    pub const DESCRIPTION: &str = "description";
    /// Due date (timestamp at midnight UTC, optional).
    pub const DUE_DATE: &str = "dueDate";
    /// Completion flag (bool).
    pub const COMPLETED: &str = "completed";
    /// Creation time (timestamp, server-assigned).
    pub const CREATED_AT: &str = "createdAt";
    /// Owning identity's uid (string).
    pub const OWNER_ID: &str = "ownerId";
}

/// Store-assigned task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A task as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned id, stable for the task's lifetime.
    pub id: TaskId,
    /// Short title.
    pub title: String,
    /// Free text.
    pub description: String,
    /// Due date; absent on records written before due dates existed.
    pub due_date: Option<NaiveDate>,
    /// Completion flag. Always `false` at creation.
    pub completed: bool,
    /// Set once by the store when the task is created.
    pub created_at: DateTime<Utc>,
    /// uid of the identity that created the task.
    pub owner_id: String,
}

impl Task {
    /// Decodes a stored document.
    ///
    /// # Errors
    ///
    /// Returns a description of the first missing or mistyped field.
    pub fn from_document(doc: &Document) -> Result<Self, String> {
        let text = |name: &str| -> Result<String, String> {
            match doc.get(name) {
                Some(FieldValue::String(s)) => Ok(s.clone()),
                Some(other) => Err(format!("field `{name}` is not a string: {other:?}")),
                None => Err(format!("missing field `{name}`")),
            }
        };

        let completed = match doc.get(fields::COMPLETED) {
            Some(FieldValue::Bool(b)) => *b,
            Some(other) => return Err(format!("field `completed` is not a bool: {other:?}")),
            None => return Err("missing field `completed`".to_string()),
        };

        let created_at = match doc.get(fields::CREATED_AT) {
            Some(FieldValue::Timestamp(ts)) => *ts,
            Some(other) => {
                return Err(format!("field `createdAt` is not a timestamp: {other:?}"))
            },
            None => return Err("missing field `createdAt`".to_string()),
        };

        let due_date = match doc.get(fields::DUE_DATE) {
            None | Some(FieldValue::Null) => None,
            Some(FieldValue::Timestamp(ts)) => Some(ts.date_naive()),
            Some(other) => return Err(format!("field `dueDate` is not a timestamp: {other:?}")),
        };

        Ok(Self {
            id: TaskId::from(doc.id.as_str()),
            title: text(fields::TITLE)?,
            description: text(fields::DESCRIPTION)?,
            due_date,
            completed,
            created_at,
            owner_id: text(fields::OWNER_ID)?,
        })
    }
}

fn due_date_value(date: NaiveDate) -> FieldValue {
    FieldValue::Timestamp(date.and_time(NaiveTime::MIN).and_utc())
}

/// Input for [`TaskStoreClient::create`](crate::TaskStoreClient::create).
///
/// The client performs no validation; see
/// [`TaskBoard::add`](crate::TaskBoard::add) for the validating entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Short title.
    pub title: String,
    /// Free text.
    pub description: String,
    /// uid of the creating identity.
    pub owner_id: String,
    /// Due date.
    pub due_date: NaiveDate,
}

impl NewTask {
    /// Creates a new task description.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        owner_id: impl Into<String>,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            owner_id: owner_id.into(),
            due_date,
        }
    }

    /// Encodes the task for insertion.
    ///
    /// `completed` starts as `false` and `createdAt` is left to the store's
    /// clock.
    pub fn into_fields(self) -> Fields {
        let mut out = Fields::new();
        out.insert(fields::TITLE.to_string(), FieldValue::String(self.title));
        out.insert(
            fields::DESCRIPTION.to_string(),
            FieldValue::String(self.description),
        );
        out.insert(fields::DUE_DATE.to_string(), due_date_value(self.due_date));
        out.insert(fields::COMPLETED.to_string(), FieldValue::Bool(false));
        out.insert(fields::CREATED_AT.to_string(), FieldValue::ServerTimestamp);
        out.insert(fields::OWNER_ID.to_string(), FieldValue::String(self.owner_id));
        out
    }
}

/// A partial update to a task.
///
/// Only `title`, `description` and `due_date` can be patched. Fields left as
/// `None` are untouched by the merge.
///
/// # Examples
///
/// ```
/// use taskdeck::TaskPatch;
///
/// let patch = TaskPatch::new().with_title("Buy oat milk");
/// assert!(!patch.is_empty());
/// assert_eq!(patch.into_fields().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
}

impl TaskPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the due date.
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.due_date.is_none()
    }

    /// Encodes only the fields that are set.
    pub fn into_fields(self) -> Fields {
        let mut out = Fields::new();
        if let Some(title) = self.title {
            out.insert(fields::TITLE.to_string(), FieldValue::String(title));
        }
        if let Some(description) = self.description {
            out.insert(
                fields::DESCRIPTION.to_string(),
                FieldValue::String(description),
            );
        }
        if let Some(due) = self.due_date {
            out.insert(fields::DUE_DATE.to_string(), due_date_value(due));
        }
        out
    }
}
