//! Route guard state machine.
//!
//! Gates a protected view on the auth-state stream: nothing renders until
//! the first auth event resolves, and an unauthenticated resolution
//! redirects to the login surface before any protected content is shown.
//! The guard holds no retry logic; the auth stream is the single source of
//! truth and every event re-evaluates the state.

use std::fmt;

use crate::auth::AuthState;

/// Guard state, per mounted protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// No auth event has been observed yet.
    Checking,
    /// The latest event carried an identity.
    Authenticated,
    /// The latest event carried no identity.
    Unauthenticated,
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Checking => "checking",
            Self::Authenticated => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        };
        f.write_str(s)
    }
}

/// What the caller should do with the protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Keep showing the "checking" placeholder; render nothing protected.
    Wait,
    /// Render the protected content.
    Render,
    /// Redirect to the login surface.
    Redirect,
}

/// Route guard consuming auth-state events.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    state: GuardState,
}

impl RouteGuard {
    /// A fresh guard starts in `Checking`.
    pub fn new() -> Self {
        Self {
            state: GuardState::Checking,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Feed one auth-state event and return the resulting decision.
    ///
    /// The first event leaves `Checking` permanently; later events can flip
    /// between `Authenticated` and `Unauthenticated` (e.g. a logout while
    /// the view is mounted).
    pub fn observe(&mut self, event: &AuthState) -> GuardDecision {
        self.state = if event.is_signed_in() {
            GuardState::Authenticated
        } else {
            GuardState::Unauthenticated
        };
        self.decision()
    }

    /// The decision implied by the current state.
    pub fn decision(&self) -> GuardDecision {
        match self.state {
            GuardState::Checking => GuardDecision::Wait,
            GuardState::Authenticated => GuardDecision::Render,
            GuardState::Unauthenticated => GuardDecision::Redirect,
        }
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}
