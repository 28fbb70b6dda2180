//! Route access resolution for the client shell.
//!
//! The client asks the server what to do with a navigation target before
//! rendering it, and the same predicates back the per-handler enforcement in
//! ClientCtx. Rule precedence:
//!
//! 1. Public targets always render.
//! 2. Unauthenticated viewers are sent to login.
//! 3. A founder whose document gate is unresolved is sent to onboarding,
//!    unless the target is the onboarding flow itself.
//! 4. A viewer outside the target's allowed-role set is sent home.
//! 5. Otherwise render.

use crate::orm::users::{Role, VerificationStatus};
use serde::Serialize;

/// What the client should do with a navigation target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAccess {
    Render,
    RedirectLogin,
    RedirectOnboarding,
    RedirectHome,
}

impl RouteAccess {
    /// Client-side path this decision points at, if any.
    pub fn redirect_to(&self) -> Option<&'static str> {
        match self {
            Self::Render => None,
            Self::RedirectLogin => Some("/login"),
            Self::RedirectOnboarding => Some("/founder/onboarding"),
            Self::RedirectHome => Some("/"),
        }
    }
}

/// Access requirements of one navigation target.
#[derive(Clone, Copy, Debug, Default)]
pub struct RouteRequirement {
    /// Renders for guests. Overrides every other rule.
    pub public: bool,
    /// Allowed-role set. None means any authenticated role.
    pub allowed_roles: Option<&'static [Role]>,
    /// Part of the founder onboarding flow, reachable with an unresolved
    /// document gate.
    pub onboarding: bool,
}

/// The viewer as far as routing cares: role and document-gate state.
#[derive(Clone, Copy, Debug)]
pub struct Viewer {
    pub role: Role,
    pub verification_status: VerificationStatus,
}

impl Viewer {
    fn gate_unresolved(&self) -> bool {
        self.role == Role::Founder && self.verification_status != VerificationStatus::Approved
    }
}

const FOUNDER_ONLY: &[Role] = &[Role::Founder];
const INVESTOR_ONLY: &[Role] = &[Role::Investor];
const MENTOR_ONLY: &[Role] = &[Role::Mentor];
const STAFF_ONLY: &[Role] = &[Role::Admin, Role::Superadmin];

/// Maps a client path onto its requirements. Longest-prefix style matching,
/// most specific rule first.
pub fn requirement_for_path(path: &str) -> RouteRequirement {
    let path = path.trim_end_matches('/');

    if path.is_empty() || path == "/login" || path == "/register" || path == "/products" {
        return RouteRequirement {
            public: true,
            ..Default::default()
        };
    }

    if path == "/founder/onboarding" || path.starts_with("/founder/verification") {
        return RouteRequirement {
            allowed_roles: Some(FOUNDER_ONLY),
            onboarding: true,
            ..Default::default()
        };
    }

    if path.starts_with("/founder") {
        return RouteRequirement {
            allowed_roles: Some(FOUNDER_ONLY),
            ..Default::default()
        };
    }

    if path.starts_with("/investor") {
        return RouteRequirement {
            allowed_roles: Some(INVESTOR_ONLY),
            ..Default::default()
        };
    }

    if path.starts_with("/mentor") {
        return RouteRequirement {
            allowed_roles: Some(MENTOR_ONLY),
            ..Default::default()
        };
    }

    if path.starts_with("/admin") {
        return RouteRequirement {
            allowed_roles: Some(STAFF_ONLY),
            ..Default::default()
        };
    }

    // Anything else is a generic authenticated page.
    RouteRequirement::default()
}

/// Pure resolution of the precedence rules above. No IO.
pub fn resolve(requirement: RouteRequirement, viewer: Option<Viewer>) -> RouteAccess {
    if requirement.public {
        return RouteAccess::Render;
    }

    let viewer = match viewer {
        Some(viewer) => viewer,
        None => return RouteAccess::RedirectLogin,
    };

    if viewer.gate_unresolved() && !requirement.onboarding {
        return RouteAccess::RedirectOnboarding;
    }

    if let Some(allowed) = requirement.allowed_roles {
        if !allowed.contains(&viewer.role) {
            return RouteAccess::RedirectHome;
        }
    }

    RouteAccess::Render
}

/// Resolve a raw client path for a viewer.
pub fn resolve_path(path: &str, viewer: Option<Viewer>) -> RouteAccess {
    resolve(requirement_for_path(path), viewer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn founder(status: VerificationStatus) -> Option<Viewer> {
        Some(Viewer {
            role: Role::Founder,
            verification_status: status,
        })
    }

    fn viewer(role: Role) -> Option<Viewer> {
        Some(Viewer {
            role,
            verification_status: VerificationStatus::NotSubmitted,
        })
    }

    #[test]
    fn public_routes_render_for_everyone() {
        assert_eq!(resolve_path("/", None), RouteAccess::Render);
        assert_eq!(resolve_path("/login", None), RouteAccess::Render);
        assert_eq!(
            resolve_path("/products", viewer(Role::Investor)),
            RouteAccess::Render
        );
    }

    #[test]
    fn guests_are_sent_to_login() {
        assert_eq!(
            resolve_path("/founder/dashboard", None),
            RouteAccess::RedirectLogin
        );
        assert_eq!(resolve_path("/admin/queries", None), RouteAccess::RedirectLogin);
        assert_eq!(resolve_path("/settings", None), RouteAccess::RedirectLogin);
    }

    #[test]
    fn unverified_founder_is_sent_to_onboarding() {
        for status in [
            VerificationStatus::NotSubmitted,
            VerificationStatus::PendingVerification,
            VerificationStatus::Rejected,
        ] {
            assert_eq!(
                resolve_path("/founder/dashboard", founder(status)),
                RouteAccess::RedirectOnboarding,
                "status {:?} must gate the dashboard",
                status
            );
        }
    }

    #[test]
    fn onboarding_flow_stays_reachable_with_unresolved_gate() {
        assert_eq!(
            resolve_path(
                "/founder/onboarding",
                founder(VerificationStatus::NotSubmitted)
            ),
            RouteAccess::Render
        );
        assert_eq!(
            resolve_path(
                "/founder/verification/status",
                founder(VerificationStatus::Rejected)
            ),
            RouteAccess::Render
        );
    }

    #[test]
    fn onboarding_redirect_takes_precedence_over_role_mismatch() {
        // An unverified founder navigating to an investor page goes to
        // onboarding, not home. Rule 3 outranks rule 4.
        assert_eq!(
            resolve_path(
                "/investor/portfolio",
                founder(VerificationStatus::PendingVerification)
            ),
            RouteAccess::RedirectOnboarding
        );
    }

    #[test]
    fn verified_founder_reaches_dashboard() {
        assert_eq!(
            resolve_path("/founder/dashboard", founder(VerificationStatus::Approved)),
            RouteAccess::Render
        );
    }

    #[test]
    fn role_mismatch_is_sent_home() {
        assert_eq!(
            resolve_path("/admin/queries", viewer(Role::Investor)),
            RouteAccess::RedirectHome
        );
        assert_eq!(
            resolve_path("/investor/portfolio", viewer(Role::Mentor)),
            RouteAccess::RedirectHome
        );
        assert_eq!(
            resolve_path("/founder/dashboard", viewer(Role::Investor)),
            RouteAccess::RedirectHome
        );
    }

    #[test]
    fn staff_roles_share_the_admin_area() {
        assert_eq!(
            resolve_path("/admin/queries", viewer(Role::Admin)),
            RouteAccess::Render
        );
        assert_eq!(
            resolve_path("/admin/queries", viewer(Role::Superadmin)),
            RouteAccess::Render
        );
    }

    #[test]
    fn generic_pages_only_require_login() {
        assert_eq!(
            resolve_path("/settings", viewer(Role::Organization)),
            RouteAccess::Render
        );
        assert_eq!(
            resolve_path("/settings", viewer(Role::Other)),
            RouteAccess::Render
        );
    }

    #[test]
    fn redirect_targets() {
        assert_eq!(RouteAccess::Render.redirect_to(), None);
        assert_eq!(RouteAccess::RedirectLogin.redirect_to(), Some("/login"));
        assert_eq!(
            RouteAccess::RedirectOnboarding.redirect_to(),
            Some("/founder/onboarding")
        );
        assert_eq!(RouteAccess::RedirectHome.redirect_to(), Some("/"));
    }
}
