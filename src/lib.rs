//! # taskdeck
//!
//! Client-side task synchronization over a document store and an external
//! identity provider.
//!
//! Users sign in through a [`SessionManager`], then create, list, edit and
//! delete their own tasks through a [`TaskStoreClient`]. A [`TaskBoard`] keeps
//! a local copy of the signed-in user's tasks consistent with the store by
//! re-fetching after every change.
//!
//! # Module Organization
//!
//! - [`task`] - Task records, new-task input and partial updates
//! - [`client`] - [`TaskStoreClient`] over a [`DocumentStore`](taskdeck_store::DocumentStore)
//! - [`error`] - [`StoreError`] and the [`Operation`] it belongs to
//! - [`session`] - Identities, the provider boundary and [`SessionManager`]
//! - [`board`] - The local task mirror driven by identity changes
//! - [`config`] - TOML configuration and backend selection
//!
//! # Feature Flags
//!
//! - `logging` (default) - [`init_logging`] via `tracing-subscriber`
//! - `redis` - Redis document store backend
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use taskdeck::{
//!     Identity, MockIdentityProvider, SessionManager, TaskBoard, TaskDraft, TaskStoreClient,
//! };
//! use taskdeck_store::InMemoryDocumentStore;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let session = SessionManager::new(Arc::new(
//!     MockIdentityProvider::new().with_outcome(Ok(Identity::new("u1"))),
//! ));
//! let client = TaskStoreClient::new(Arc::new(InMemoryDocumentStore::new()));
//! let mut board = TaskBoard::new(client);
//!
//! let who = session.sign_in().await;
//! board.on_identity_changed(who).await.unwrap();
//!
//! let due = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
//! board.add(TaskDraft::new("Buy milk", "2%", due)).await.unwrap();
//! assert_eq!(board.tasks()[0].title, "Buy milk");
//! # });
//! ```

pub mod board;
pub mod client;
pub mod config;
pub mod error;
#[cfg(feature = "logging")]
mod logging;
pub mod session;
pub mod task;

pub use board::{BoardError, TaskBoard, TaskDraft};
pub use client::TaskStoreClient;
pub use config::{ConfigError, TaskdeckConfig};
pub use error::{Operation, StoreError};
#[cfg(feature = "logging")]
pub use logging::init_logging;
pub use session::{
    AuthError, Identity, IdentityFeed, IdentityProvider, MockIdentityProvider, SessionManager,
    StaticIdentityProvider, Subscription,
};
pub use task::{NewTask, Task, TaskId, TaskPatch};
