//! Role-based route guarding.

use crate::auth::context::{Route, SessionContext, SessionState};
use crate::auth::session::UserRole;

/// Outcome of a guard check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show the protected view.
    Render,
    /// Send the user elsewhere.
    Redirect(Route),
}

/// Gates a protected view on authentication and role.
///
/// An empty role set admits any authenticated user.
///
/// # Example
///
/// ```rust
/// use phantom_banking::auth::{GuardDecision, Route, RouteGuard, SessionContext};
/// use phantom_banking::UserRole;
///
/// let guard = RouteGuard::new([UserRole::Merchant]);
/// let context = SessionContext::new();
///
/// assert_eq!(guard.check(&context), GuardDecision::Redirect(Route::Login));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteGuard {
    allowed_roles: Vec<UserRole>,
}

impl RouteGuard {
    /// Creates a guard admitting the given roles.
    #[must_use]
    pub fn new(allowed_roles: impl IntoIterator<Item = UserRole>) -> Self {
        let mut roles: Vec<UserRole> = Vec::new();
        for role in allowed_roles {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        Self {
            allowed_roles: roles,
        }
    }

    /// Creates a guard admitting any authenticated user.
    #[must_use]
    pub const fn any_role() -> Self {
        Self {
            allowed_roles: Vec::new(),
        }
    }

    /// Returns the admitted roles. Empty means any.
    #[must_use]
    pub fn allowed_roles(&self) -> &[UserRole] {
        &self.allowed_roles
    }

    /// Returns `true` if the role may see the protected view.
    #[must_use]
    pub fn admits(&self, role: UserRole) -> bool {
        self.allowed_roles.is_empty() || self.allowed_roles.contains(&role)
    }

    /// Decides against the current session.
    #[must_use]
    pub fn check(&self, context: &SessionContext) -> GuardDecision {
        self.check_state(&context.state())
    }

    /// Decides against a state snapshot.
    #[must_use]
    pub fn check_state(&self, state: &SessionState) -> GuardDecision {
        match state {
            SessionState::Unauthenticated => GuardDecision::Redirect(Route::Login),
            SessionState::Authenticated(user) if self.admits(user.role) => GuardDecision::Render,
            SessionState::Authenticated(user) => {
                tracing::debug!(
                    "Role {} not admitted, allowed: {:?}",
                    user.role,
                    self.allowed_roles
                );
                GuardDecision::Redirect(Route::Unauthorized)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::AuthUser;

    fn signed_in(role: UserRole) -> SessionState {
        SessionState::Authenticated(AuthUser::new("u-1", role))
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        let guard = RouteGuard::new([UserRole::Admin]);
        assert_eq!(
            guard.check_state(&SessionState::Unauthenticated),
            GuardDecision::Redirect(Route::Login)
        );
        assert_eq!(
            RouteGuard::any_role().check_state(&SessionState::Unauthenticated),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn test_wrong_role_redirects_to_unauthorized() {
        let guard = RouteGuard::new([UserRole::Admin]);
        assert_eq!(
            guard.check_state(&signed_in(UserRole::Merchant)),
            GuardDecision::Redirect(Route::Unauthorized)
        );
    }

    #[test]
    fn test_allowed_role_renders() {
        let guard = RouteGuard::new([UserRole::Merchant, UserRole::Admin]);
        assert_eq!(
            guard.check_state(&signed_in(UserRole::Merchant)),
            GuardDecision::Render
        );
        assert_eq!(
            guard.check_state(&signed_in(UserRole::Admin)),
            GuardDecision::Render
        );
        assert_eq!(
            guard.check_state(&signed_in(UserRole::Customer)),
            GuardDecision::Redirect(Route::Unauthorized)
        );
    }

    #[test]
    fn test_any_role_admits_every_signed_in_user() {
        let guard = RouteGuard::any_role();
        for role in [UserRole::Admin, UserRole::Merchant, UserRole::Customer] {
            assert_eq!(guard.check_state(&signed_in(role)), GuardDecision::Render);
        }
    }

    #[test]
    fn test_duplicate_roles_are_collapsed() {
        let guard = RouteGuard::new([UserRole::Customer, UserRole::Customer]);
        assert_eq!(guard.allowed_roles(), &[UserRole::Customer]);
    }
}
