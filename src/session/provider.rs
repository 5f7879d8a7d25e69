//! The identity provider boundary.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};

use super::identity::{AuthError, Identity};

/// An external authentication service.
///
/// Providers own the session state. They expose it twice: the latest value
/// through [`identity_changes`](Self::identity_changes) and every transition,
/// in order, through [`identity_events`](Self::identity_events). An
/// [`IdentityFeed`] keeps the two in step. A
/// [`SessionManager`](crate::SessionManager) only observes them.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use taskdeck::{AuthError, Identity, IdentityFeed, IdentityProvider};
/// use tokio::sync::{broadcast, watch};
///
/// struct AlwaysCancelled(IdentityFeed);
///
/// #[async_trait]
/// impl IdentityProvider for AlwaysCancelled {
///     async fn sign_in_interactive(&self) -> Result<Identity, AuthError> {
///         Err(AuthError::Cancelled)
///     }
///
///     async fn sign_out(&self) -> Result<(), AuthError> {
///         self.0.publish(None);
///         Ok(())
///     }
///
///     fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
///         self.0.watch()
///     }
///
///     fn identity_events(&self) -> broadcast::Receiver<Option<Identity>> {
///         self.0.events()
///     }
/// }
/// ```
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Runs the interactive sign-in flow.
    ///
    /// On success the provider also publishes the new identity.
    ///
    /// # Errors
    ///
    /// [`AuthError::Cancelled`] if the user aborts, otherwise
    /// [`AuthError::Provider`] or [`AuthError::Network`].
    async fn sign_in_interactive(&self) -> Result<Identity, AuthError>;

    /// Ends the current session. Signing out while signed out succeeds.
    ///
    /// # Errors
    ///
    /// [`AuthError::Provider`] or [`AuthError::Network`].
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Returns a receiver holding the current identity, updated on every
    /// transition.
    fn identity_changes(&self) -> watch::Receiver<Option<Identity>>;

    /// Returns a receiver for every transition published after this call.
    fn identity_events(&self) -> broadcast::Receiver<Option<Identity>>;
}

/// Transitions a slow subscriber may fall behind by before it resyncs from
/// the latest state.
const EVENT_CAPACITY: usize = 64;

/// Session state publisher for [`IdentityProvider`] implementations.
///
/// Every [`publish`](Self::publish) updates the latest value and appends one
/// event, under a lock so both channels see transitions in the same order.
#[derive(Debug)]
pub struct IdentityFeed {
    state: watch::Sender<Option<Identity>>,
    events: broadcast::Sender<Option<Identity>>,
    publish_lock: Mutex<()>,
}

impl Default for IdentityFeed {
    fn default() -> Self {
        Self::new(None)
    }
}

impl IdentityFeed {
    /// Creates a feed whose current identity is `initial`.
    pub fn new(initial: Option<Identity>) -> Self {
        let (state, _) = watch::channel(initial);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state,
            events,
            publish_lock: Mutex::new(()),
        }
    }

    /// Records a transition to `identity`.
    pub fn publish(&self, identity: Option<Identity>) {
        let _guard = self.publish_lock.lock();
        self.state.send_replace(identity.clone());
        // No event receivers is fine; the watch value still moves.
        let _ = self.events.send(identity);
    }

    /// The latest published identity.
    pub fn current(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    /// A receiver for the latest identity.
    pub fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }

    /// A receiver for transitions published from now on.
    pub fn events(&self) -> broadcast::Receiver<Option<Identity>> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn feed_keeps_every_event_and_the_latest_state() {
        let feed = IdentityFeed::default();
        let mut events = feed.events();

        feed.publish(Some(Identity::new("u1")));
        feed.publish(None);
        feed.publish(Some(Identity::new("u1")));

        assert_eq!(feed.current(), Some(Identity::new("u1")));
        assert_eq!(events.try_recv().unwrap(), Some(Identity::new("u1")));
        assert_eq!(events.try_recv().unwrap(), None);
        assert_eq!(events.try_recv().unwrap(), Some(Identity::new("u1")));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn publish_without_listeners_still_updates_state() {
        let feed = IdentityFeed::new(Some(Identity::new("u1")));
        let rx = feed.watch();
        feed.publish(None);
        assert_eq!(*rx.borrow(), None);
    }
}
