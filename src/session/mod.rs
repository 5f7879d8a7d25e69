//! Session management over an external identity provider.
//!
//! [`SessionManager`] turns an [`IdentityProvider`] into the contract the
//! rest of the application relies on:
//!
//! - [`sign_in`](SessionManager::sign_in) never fails. Cancellation and
//!   provider errors are logged and reported as `None`.
//! - [`sign_out`](SessionManager::sign_out) is idempotent and never fails.
//! - [`subscribe`](SessionManager::subscribe) delivers the current identity
//!   right away, then every transition.
//!
//! Exactly one identity is tracked at a time.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use taskdeck::{Identity, MockIdentityProvider, SessionManager};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let provider = MockIdentityProvider::new().with_outcome(Ok(Identity::new("u1")));
//! let session = SessionManager::new(Arc::new(provider));
//!
//! assert_eq!(session.current(), None);
//! let who = session.sign_in().await;
//! assert_eq!(who.map(|id| id.uid), Some("u1".to_string()));
//!
//! session.sign_out().await;
//! session.sign_out().await;
//! assert_eq!(session.current(), None);
//! # });
//! ```

mod identity;
mod mock;
mod provider;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use identity::{AuthError, Identity};
pub use mock::{MockIdentityProvider, StaticIdentityProvider};
pub use provider::{IdentityFeed, IdentityProvider};

/// Wraps an [`IdentityProvider`] so that auth failures never reach callers.
#[derive(Clone)]
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a session manager over `provider`.
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// Runs the interactive sign-in flow.
    ///
    /// Returns the new identity, or `None` if the user cancelled or the
    /// provider failed. Failures are logged.
    pub async fn sign_in(&self) -> Option<Identity> {
        match self.provider.sign_in_interactive().await {
            Ok(identity) => {
                tracing::debug!(uid = %identity.uid, "signed in");
                Some(identity)
            },
            Err(AuthError::Cancelled) => {
                tracing::debug!("sign-in cancelled");
                None
            },
            Err(err) => {
                tracing::warn!(error = %err, "sign-in failed");
                None
            },
        }
    }

    /// Ends the current session.
    ///
    /// Safe to call while signed out. Provider failures are logged.
    pub async fn sign_out(&self) {
        match self.provider.sign_out().await {
            Ok(()) => tracing::debug!("signed out"),
            Err(err) => tracing::warn!(error = %err, "sign-out failed"),
        }
    }

    /// The identity currently signed in, if any.
    pub fn current(&self) -> Option<Identity> {
        self.provider.identity_changes().borrow().clone()
    }

    /// A receiver for async consumers that want to await transitions directly.
    pub fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.provider.identity_changes()
    }

    /// Registers `callback` for identity changes.
    ///
    /// The callback runs once synchronously with the current identity, then
    /// on a spawned task for every transition, in order. A transition equal
    /// to the one delivered just before it is skipped.
    ///
    /// If the callback falls too far behind, skipped transitions are
    /// replaced by a single call with the latest identity.
    ///
    /// Dropping the returned [`Subscription`] does not stop delivery; call
    /// [`Subscription::unsubscribe`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn subscribe<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(Option<Identity>) + Send + 'static,
    {
        let mut events = self.provider.identity_events();
        let state = self.provider.identity_changes();
        let mut last = state.borrow().clone();
        callback(last.clone());

        let active = Arc::new(AtomicBool::new(true));
        let still_active = Arc::clone(&active);
        let handle = tokio::spawn(async move {
            loop {
                let next = match events.recv().await {
                    Ok(next) => next,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "identity subscriber lagged; resyncing");
                        state.borrow().clone()
                    },
                    Err(RecvError::Closed) => break,
                };
                if !still_active.load(Ordering::Acquire) {
                    break;
                }
                if next != last {
                    callback(next.clone());
                    last = next;
                }
            }
            tracing::trace!("identity provider closed; subscription finished");
        });

        Subscription { handle, active }
    }
}

/// Handle returned by [`SessionManager::subscribe`].
#[must_use = "a subscription keeps running until `unsubscribe` is called"]
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// Stops future callback invocations.
    ///
    /// No callback starts after this returns. A callback already running on
    /// another worker thread finishes first.
    pub fn unsubscribe(self) {
        self.active.store(false, Ordering::Release);
        self.handle.abort();
    }

    /// Returns `true` while the subscription can still deliver changes.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire) && !self.handle.is_finished()
    }
}
