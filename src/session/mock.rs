//! In-process identity providers for tests and local single-user runs.
//!
//! Neither provider talks to a real authentication service. **Never use
//! them to guard real data.**

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};

use super::identity::{AuthError, Identity};
use super::provider::{IdentityFeed, IdentityProvider};

/// Identity provider with scripted sign-in outcomes.
///
/// Each [`sign_in_interactive`](IdentityProvider::sign_in_interactive) call
/// consumes the next queued outcome. With nothing queued, sign-in fails with
/// [`AuthError::Provider`].
///
/// # Example
///
/// ```rust
/// use taskdeck::{AuthError, Identity, MockIdentityProvider};
///
/// let provider = MockIdentityProvider::new()
///     .with_outcome(Err(AuthError::Cancelled))
///     .with_outcome(Ok(Identity::new("u1")));
/// assert_eq!(provider.pending_outcomes(), 2);
/// ```
#[derive(Debug)]
pub struct MockIdentityProvider {
    outcomes: Mutex<VecDeque<Result<Identity, AuthError>>>,
    sign_out_failure: Mutex<Option<AuthError>>,
    feed: IdentityFeed,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIdentityProvider {
    /// Creates a signed-out provider with no scripted outcomes.
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            sign_out_failure: Mutex::new(None),
            feed: IdentityFeed::default(),
            sign_in_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    /// Creates a provider that is already signed in as `identity`.
    pub fn signed_in_as(identity: Identity) -> Self {
        Self {
            feed: IdentityFeed::new(Some(identity)),
            ..Self::new()
        }
    }

    /// Queues the outcome of a future sign-in.
    pub fn with_outcome(self, outcome: Result<Identity, AuthError>) -> Self {
        self.push_outcome(outcome);
        self
    }

    /// Queues the outcome of a future sign-in.
    pub fn push_outcome(&self, outcome: Result<Identity, AuthError>) {
        self.outcomes.lock().push_back(outcome);
    }

    /// Makes the next sign-out fail with `error`. The session stays active.
    pub fn fail_next_sign_out(&self, error: AuthError) {
        *self.sign_out_failure.lock() = Some(error);
    }

    /// Publishes a transition that did not come from this process, such as a
    /// session expiring or another tab signing in.
    pub fn set_identity(&self, identity: Option<Identity>) {
        self.feed.publish(identity);
    }

    /// Number of queued sign-in outcomes.
    pub fn pending_outcomes(&self) -> usize {
        self.outcomes.lock().len()
    }

    /// Number of sign-in attempts so far.
    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    /// Number of sign-out attempts so far.
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_in_interactive(&self) -> Result<Identity, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                Err(AuthError::Provider {
                    message: "no scripted sign-in outcome".to_string(),
                })
            });

        if let Ok(identity) = &outcome {
            self.feed.publish(Some(identity.clone()));
        }
        outcome
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.sign_out_failure.lock().take() {
            return Err(err);
        }
        self.feed.publish(None);
        Ok(())
    }

    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.feed.watch()
    }

    fn identity_events(&self) -> broadcast::Receiver<Option<Identity>> {
        self.feed.events()
    }
}

/// Identity provider that always signs in as one fixed identity.
///
/// Built from the `[identity]` table of
/// [`TaskdeckConfig`](crate::TaskdeckConfig) for local single-user runs.
#[derive(Debug)]
pub struct StaticIdentityProvider {
    identity: Identity,
    feed: IdentityFeed,
}

impl StaticIdentityProvider {
    /// Creates a signed-out provider that signs in as `identity`.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            feed: IdentityFeed::default(),
        }
    }

    /// The identity every sign-in yields.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn sign_in_interactive(&self) -> Result<Identity, AuthError> {
        self.feed.publish(Some(self.identity.clone()));
        Ok(self.identity.clone())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.feed.publish(None);
        Ok(())
    }

    fn identity_changes(&self) -> watch::Receiver<Option<Identity>> {
        self.feed.watch()
    }

    fn identity_events(&self) -> broadcast::Receiver<Option<Identity>> {
        self.feed.events()
    }
}
