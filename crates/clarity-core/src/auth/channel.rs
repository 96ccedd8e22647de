//! Reactive current-user stream.
//!
//! Re-expresses the callback-driven auth-state subscription as an explicit
//! channel built on [`tokio::sync::watch`].
//!
//! First-emission contract: a new subscriber always observes the resolved
//! current state immediately via [`watch::Receiver::borrow`], even when that
//! state is "signed out" -- there is no window where a subscriber sees
//! nothing. Subsequent logins and logouts publish a new state to every
//! subscriber.

use std::sync::Arc;

use clarity_db::models::User;
use tokio::sync::watch;

/// The resolved authentication state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No identity is associated with the session.
    SignedOut,
    /// An authenticated identity.
    SignedIn(User),
}

impl AuthState {
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::SignedIn(user) => Some(user),
            Self::SignedOut => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

/// Broadcast channel for auth-state changes.
///
/// Scope is the owning gateway instance, not an individual user: an
/// embedding that holds one gateway per browser session gets a per-session
/// stream, while a server that shares one gateway across requests gets a
/// single process-wide stream where any logout publishes `SignedOut`.
/// Per-request authorization never reads this stream; bearer tokens are
/// validated on their own.
#[derive(Debug, Clone)]
pub struct AuthChannel {
    tx: Arc<watch::Sender<AuthState>>,
}

impl AuthChannel {
    /// Create a channel whose initial resolved state is signed-out.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::SignedOut);
        Self { tx: Arc::new(tx) }
    }

    /// Publish a new auth state to all subscribers.
    pub fn publish(&self, state: AuthState) {
        // send only fails when every receiver is gone; the state is still
        // stored for future subscribers, so the error is ignorable.
        let _ = self.tx.send(state);
    }

    /// Subscribe to auth-state changes.
    ///
    /// The receiver's first `borrow()` yields the current resolved state.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    /// The current resolved state.
    pub fn current(&self) -> AuthState {
        self.tx.borrow().clone()
    }
}

impl Default for AuthChannel {
    fn default() -> Self {
        Self::new()
    }
}
