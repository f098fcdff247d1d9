// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access decisions for protected views.
//!
//! Pure functions over a [`SessionState`] snapshot; views call them synchronously on every state
//! change to pick what to render. No side effects, no awaiting.

use crate::resolver::SessionState;
use crate::role::Role;

/// What a protected view should render for the current session state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccessDecision {
    /// Session is still resolving; render a loading indicator.
    Loading,

    /// No identity is signed in; redirect to the login view.
    RedirectToLogin,

    /// Signed in, but the resolved role does not grant access; render a denial view.
    Denied,

    /// Render the protected content.
    Granted,
}

/// Decide access for a view restricted to the given roles.
///
/// While `loading` is set the decision is always [`AccessDecision::Loading`], regardless of
/// identity or role; this prevents a flash of the login redirect during sign-in.
pub fn decide(state: &SessionState, allowed_roles: &[Role]) -> AccessDecision {
    if state.loading {
        return AccessDecision::Loading;
    }

    if state.identity.is_none() {
        return AccessDecision::RedirectToLogin;
    }

    match state.role {
        Some(role) if allowed_roles.contains(&role) => AccessDecision::Granted,
        _ => AccessDecision::Denied,
    }
}

/// Decide access for a view which only requires a signed-in identity, with no role restriction.
pub fn decide_authenticated(state: &SessionState) -> AccessDecision {
    if state.loading {
        return AccessDecision::Loading;
    }

    if state.identity.is_none() {
        return AccessDecision::RedirectToLogin;
    }

    AccessDecision::Granted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    fn state(identity: Option<Identity>, role: Option<Role>, loading: bool) -> SessionState {
        SessionState {
            identity,
            role,
            loading,
        }
    }

    fn signed_in(role: Option<Role>) -> SessionState {
        state(Some(Identity::new("u1", "u1@example.org")), role, false)
    }

    #[test]
    fn loading_wins_over_everything() {
        let loading = state(Some(Identity::new("u1", "u1@example.org")), None, true);
        assert_eq!(decide(&loading, &[Role::Editor]), AccessDecision::Loading);
        assert_eq!(decide_authenticated(&loading), AccessDecision::Loading);

        let cold_start = state(None, None, true);
        assert_eq!(decide(&cold_start, &[Role::Viewer]), AccessDecision::Loading);
    }

    #[test]
    fn no_identity_redirects_to_login() {
        let signed_out = state(None, None, false);
        assert_eq!(
            decide(&signed_out, &[Role::Editor, Role::Viewer]),
            AccessDecision::RedirectToLogin
        );
        assert_eq!(
            decide_authenticated(&signed_out),
            AccessDecision::RedirectToLogin
        );
    }

    #[test]
    fn role_outside_allow_list_is_denied() {
        assert_eq!(
            decide(&signed_in(Some(Role::Viewer)), &[Role::Editor]),
            AccessDecision::Denied
        );
        assert_eq!(
            decide(&signed_in(None), &[Role::Editor, Role::Viewer]),
            AccessDecision::Denied
        );
    }

    #[test]
    fn allowed_role_is_granted() {
        assert_eq!(
            decide(&signed_in(Some(Role::Editor)), &[Role::Editor]),
            AccessDecision::Granted
        );
        assert_eq!(
            decide(&signed_in(Some(Role::Viewer)), &[Role::Editor, Role::Viewer]),
            AccessDecision::Granted
        );
    }

    #[test]
    fn authenticated_view_ignores_role() {
        assert_eq!(
            decide_authenticated(&signed_in(None)),
            AccessDecision::Granted
        );
        assert_eq!(
            decide_authenticated(&signed_in(Some(Role::Viewer))),
            AccessDecision::Granted
        );
    }
}
