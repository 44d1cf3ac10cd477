//! Per-navigation authorization gate.
//!
//! Every screen consults a `RouteGuard` against the identity store on
//! every navigation event, so actor or role changes take effect on the
//! next navigation rather than once per session.

use crate::models::Role;
use crate::store::IdentityStore;

/// Outcome of one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Store not yet initialized; suspend rendering behind a loading
    /// indicator and re-evaluate.
    Checking,
    /// Render the requested content.
    Allowed,
    /// Unauthenticated. Preserves the requested path for a post-login
    /// redirect.
    RedirectLogin { from: String },
    /// Authenticated but the role is outside the allowed set; silent
    /// redirect to the default authenticated screen.
    RedirectHome,
}

/// Authorization requirements for one route.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    allowed_roles: Option<Vec<Role>>,
}

impl RouteGuard {
    /// Guard that only requires authentication.
    pub fn authenticated() -> Self {
        Self {
            allowed_roles: None,
        }
    }

    /// Guard restricted to a role set.
    pub fn with_roles(roles: impl Into<Vec<Role>>) -> Self {
        Self {
            allowed_roles: Some(roles.into()),
        }
    }

    /// Evaluate one navigation attempt.
    ///
    /// Never authorizes against an uninitialized store, never surfaces
    /// an error: every path normalizes to a decision.
    pub fn evaluate(&self, store: &IdentityStore, requested_path: &str) -> RouteDecision {
        if !store.is_initialized() {
            return RouteDecision::Checking;
        }

        let actor = match store.actor() {
            Some(actor) => actor,
            None => {
                return RouteDecision::RedirectLogin {
                    from: requested_path.to_string(),
                }
            }
        };

        if let Some(ref allowed) = self.allowed_roles {
            if !actor.has_role(allowed) {
                return RouteDecision::RedirectHome;
            }
        }

        RouteDecision::Allowed
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::Profile;
    use crate::store::{NoopNavigator, SnapshotStore};

    fn empty_store(dir: &std::path::Path) -> IdentityStore {
        IdentityStore::new(
            SnapshotStore::new(dir.to_path_buf()),
            Box::new(NoopNavigator),
        )
    }

    fn profile(role: Role) -> Profile {
        Profile {
            id: "u1".into(),
            full_name: "Dana Reyes".into(),
            role,
            manager_id: None,
            team: "Platform".into(),
            force_password_change: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_uninitialized_store_is_checking() {
        let dir = tempfile::tempdir().unwrap();
        let store = empty_store(dir.path());

        let decision = RouteGuard::authenticated().evaluate(&store, "/reports");
        assert_eq!(decision, RouteDecision::Checking);
    }

    #[test]
    fn test_no_actor_redirects_to_login_with_origin() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = empty_store(dir.path());
        store.mark_initialized_for_tests();

        let decision = RouteGuard::authenticated().evaluate(&store, "/timesheets");
        assert_eq!(
            decision,
            RouteDecision::RedirectLogin {
                from: "/timesheets".to_string()
            }
        );
    }

    #[test]
    fn test_actor_without_role_restriction_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = empty_store(dir.path());
        store.mark_initialized_for_tests();
        store.set_actor(Some(profile(Role::Employee)));

        let decision = RouteGuard::authenticated().evaluate(&store, "/dashboard");
        assert_eq!(decision, RouteDecision::Allowed);
    }

    #[test]
    fn test_employee_on_admin_route_redirects_home() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = empty_store(dir.path());
        store.mark_initialized_for_tests();
        store.set_actor(Some(profile(Role::Employee)));

        let guard = RouteGuard::with_roles(vec![Role::Admin]);
        assert_eq!(guard.evaluate(&store, "/admin"), RouteDecision::RedirectHome);
    }

    #[test]
    fn test_role_in_allowed_set_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = empty_store(dir.path());
        store.mark_initialized_for_tests();
        store.set_actor(Some(profile(Role::Hr)));

        let guard = RouteGuard::with_roles(vec![Role::Admin, Role::Hr]);
        assert_eq!(guard.evaluate(&store, "/hr"), RouteDecision::Allowed);
    }

    #[test]
    fn test_reevaluation_reflects_actor_changes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = empty_store(dir.path());
        store.mark_initialized_for_tests();
        store.set_actor(Some(profile(Role::Admin)));

        let guard = RouteGuard::with_roles(vec![Role::Admin]);
        assert_eq!(guard.evaluate(&store, "/admin"), RouteDecision::Allowed);

        // Actor cleared between navigations: next check redirects
        store.set_actor(None);
        assert_eq!(
            guard.evaluate(&store, "/admin"),
            RouteDecision::RedirectLogin {
                from: "/admin".to_string()
            }
        );
    }
}
