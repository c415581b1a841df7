//! Shared, observable session state.
//!
//! [`SessionContext`] is the single source of truth for "who is signed in"
//! while the process runs. It starts from whatever the [`TokenStore`] holds
//! and is updated by the auth service and the HTTP client. Observers can
//! [`subscribe`](SessionContext::subscribe) to state changes.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use crate::auth::session::{AuthUser, UserRole};
use crate::auth::store::TokenStore;

/// Authentication state exposed to consumers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No session.
    Unauthenticated,
    /// A session exists for this user.
    Authenticated(AuthUser),
}

/// Views a guard or the client may send the user to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// The login view.
    Login,
    /// The "not allowed" view for authenticated users with the wrong role.
    Unauthorized,
}

impl Route {
    /// Returns the conventional path of this view.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Unauthorized => "/unauthorized",
        }
    }
}

#[derive(Debug)]
struct ContextInner {
    state: watch::Sender<SessionState>,
    redirect: Mutex<Option<Route>>,
}

/// Handle to the process-wide session state.
///
/// Clones share the same state.
///
/// # Example
///
/// ```rust
/// use phantom_banking::auth::{SessionContext, TokenStore};
///
/// let store = TokenStore::in_memory();
/// let context = SessionContext::restore(&store);
///
/// assert!(!context.is_authenticated());
/// assert!(context.role().is_none());
/// ```
#[derive(Clone, Debug)]
pub struct SessionContext {
    inner: Arc<ContextInner>,
}

// Verify SessionContext is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SessionContext>();
};

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Creates an unauthenticated context.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            inner: Arc::new(ContextInner {
                state,
                redirect: Mutex::new(None),
            }),
        }
    }

    /// Creates a context from the persisted session, if a complete one exists.
    #[must_use]
    pub fn restore(store: &TokenStore) -> Self {
        let context = Self::new();
        if let Some(session) = store.session() {
            tracing::debug!("Restored persisted session for user {}", session.user.id);
            context.inner.state.send_replace(SessionState::Authenticated(session.user));
        }
        context
    }

    /// Returns a snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Returns `true` if a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(*self.inner.state.borrow(), SessionState::Authenticated(_))
    }

    /// Returns the signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<AuthUser> {
        match &*self.inner.state.borrow() {
            SessionState::Authenticated(user) => Some(user.clone()),
            SessionState::Unauthenticated => None,
        }
    }

    /// Returns the signed-in user's role, if any.
    #[must_use]
    pub fn role(&self) -> Option<UserRole> {
        match &*self.inner.state.borrow() {
            SessionState::Authenticated(user) => Some(user.role),
            SessionState::Unauthenticated => None,
        }
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Returns the most recent forced navigation, if any.
    #[must_use]
    pub fn last_redirect(&self) -> Option<Route> {
        *self.lock_redirect()
    }

    /// Returns and clears the most recent forced navigation.
    pub fn take_redirect(&self) -> Option<Route> {
        self.lock_redirect().take()
    }

    pub(crate) fn set_authenticated(&self, user: AuthUser) {
        *self.lock_redirect() = None;
        self.inner.state.send_replace(SessionState::Authenticated(user));
    }

    pub(crate) fn set_unauthenticated(&self) {
        self.inner.state.send_replace(SessionState::Unauthenticated);
    }

    /// Drops to unauthenticated and records a forced navigation.
    pub(crate) fn force_redirect(&self, route: Route) {
        *self.lock_redirect() = Some(route);
        self.inner.state.send_replace(SessionState::Unauthenticated);
    }

    fn lock_redirect(&self) -> std::sync::MutexGuard<'_, Option<Route>> {
        self.inner
            .redirect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
