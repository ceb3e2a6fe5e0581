/// Route guards for staff-only areas
///
/// A [`RouteGuard`] decides whether a protected area may be served. It starts
/// in `Loading`, looks up the caller's role rows and settles in `Allowed`
/// (render) or `Denied` (redirect home). The first denial of a guard instance
/// carries an "access denied" notice; later resolutions of the same instance
/// carry none, so a user is told once per visit.
///
/// Guards never cache roles: every `check` reads `user_roles` again, and the
/// API builds a new guard for each request.
///
/// ```text
///            ┌──────────┐ role ok  ┌─────────┐
///  new() ──> │ Loading  │ ───────> │ Allowed │
///            └──────────┘          └─────────┘
///                 │ missing role / no user / lookup error
///                 v
///            ┌──────────┐
///            │  Denied  │  notice on first denial only
///            └──────────┘
/// ```

use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::role::{AppRole, UserRole};

/// Where denied visitors are sent
pub const DENIED_REDIRECT: &str = "/";

/// Notice shown on the first denial
pub const ACCESS_DENIED_NOTICE: &str = "Access denied";

/// Role a guarded area requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardRequirement {
    /// Admin role row required
    Admin,

    /// Moderator or admin role row required
    Staff,
}

impl GuardRequirement {
    pub fn is_met_by(&self, roles: &[AppRole]) -> bool {
        match self {
            GuardRequirement::Admin => roles.contains(&AppRole::Admin),
            GuardRequirement::Staff => AppRole::highest(roles).has_permission(&AppRole::Moderator),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardState {
    Loading,
    Allowed,
    Denied,
}

/// What the caller should do after a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum GuardDecision {
    Render,
    Redirect {
        to: &'static str,
        notice: Option<&'static str>,
    },
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    requirement: GuardRequirement,
    state: GuardState,
    notified: bool,
}

impl RouteGuard {
    pub fn new(requirement: GuardRequirement) -> Self {
        Self {
            requirement,
            state: GuardState::Loading,
            notified: false,
        }
    }

    /// Guard for admin-only areas
    pub fn admin() -> Self {
        Self::new(GuardRequirement::Admin)
    }

    /// Guard for moderation areas (moderators and admins)
    pub fn moderator() -> Self {
        Self::new(GuardRequirement::Staff)
    }

    pub fn requirement(&self) -> GuardRequirement {
        self.requirement
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Settles the guard given the caller's role rows
    pub fn resolve(&mut self, roles: &[AppRole]) -> GuardDecision {
        if self.requirement.is_met_by(roles) {
            self.state = GuardState::Allowed;
            return GuardDecision::Render;
        }
        self.deny()
    }

    fn deny(&mut self) -> GuardDecision {
        self.state = GuardState::Denied;

        let notice = if self.notified {
            None
        } else {
            self.notified = true;
            Some(ACCESS_DENIED_NOTICE)
        };

        GuardDecision::Redirect {
            to: DENIED_REDIRECT,
            notice,
        }
    }

    /// Reads the caller's roles and settles the guard
    ///
    /// Anonymous callers are denied without a lookup. A failed lookup is
    /// logged and treated as a denial.
    pub async fn check(&mut self, pool: &PgPool, user_id: Option<Uuid>) -> GuardDecision {
        self.state = GuardState::Loading;

        let Some(user_id) = user_id else {
            return self.deny();
        };

        match UserRole::roles_for_user(pool, user_id).await {
            Ok(roles) => {
                let decision = self.resolve(&roles);
                debug!(%user_id, requirement = ?self.requirement, state = ?self.state, "Route guard resolved");
                decision
            }
            Err(e) => {
                warn!(%user_id, error = %e, "Role lookup failed, denying access");
                self.deny()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_loading() {
        assert_eq!(RouteGuard::admin().state(), GuardState::Loading);
        assert_eq!(RouteGuard::moderator().state(), GuardState::Loading);
    }

    #[test]
    fn test_admin_guard_allows_admin_only() {
        let mut guard = RouteGuard::admin();
        assert_eq!(guard.resolve(&[AppRole::User, AppRole::Admin]), GuardDecision::Render);
        assert_eq!(guard.state(), GuardState::Allowed);

        let mut guard = RouteGuard::admin();
        assert!(matches!(
            guard.resolve(&[AppRole::Moderator]),
            GuardDecision::Redirect { .. }
        ));
        assert_eq!(guard.state(), GuardState::Denied);
    }

    #[test]
    fn test_moderator_guard_accepts_staff() {
        for roles in [&[AppRole::Moderator][..], &[AppRole::Admin][..]] {
            let mut guard = RouteGuard::moderator();
            assert_eq!(guard.resolve(roles), GuardDecision::Render);
        }

        let mut guard = RouteGuard::moderator();
        assert_eq!(guard.resolve(&[AppRole::User]), GuardDecision::Redirect {
            to: "/",
            notice: Some(ACCESS_DENIED_NOTICE),
        });
    }

    #[test]
    fn test_notice_is_sent_once_per_instance() {
        let mut guard = RouteGuard::admin();

        let first = guard.resolve(&[]);
        let second = guard.resolve(&[]);
        let third = guard.resolve(&[AppRole::User]);

        assert_eq!(first, GuardDecision::Redirect { to: "/", notice: Some(ACCESS_DENIED_NOTICE) });
        assert_eq!(second, GuardDecision::Redirect { to: "/", notice: None });
        assert_eq!(third, GuardDecision::Redirect { to: "/", notice: None });

        // A fresh instance notifies again
        let mut next = RouteGuard::admin();
        assert_eq!(
            next.resolve(&[]),
            GuardDecision::Redirect { to: "/", notice: Some(ACCESS_DENIED_NOTICE) }
        );
    }

    #[test]
    fn test_requirement_matrix() {
        assert!(!GuardRequirement::Admin.is_met_by(&[]));
        assert!(!GuardRequirement::Staff.is_met_by(&[AppRole::User]));
        assert!(GuardRequirement::Staff.is_met_by(&[AppRole::User, AppRole::Moderator]));
    }
}
