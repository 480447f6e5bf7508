//! Viewer/editor capability model for shared plans.
//!
//! A plan's access list is stored as rows of `{email, role, user_id?}`;
//! capability questions are answered by the pure predicates in this module
//! so handlers, repositories, and tests all agree on one definition. An
//! entry may lack `user_id` until the invited email registers -- matching
//! is by user id when present, by normalized email otherwise.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Share roles
// ---------------------------------------------------------------------------

/// Known collaborator roles.
pub mod share_roles {
    /// May view the plan and create instances from it.
    pub const VIEWER: &str = "viewer";
    /// May additionally edit plan content and share with others (at most
    /// editor role).
    pub const EDITOR: &str = "editor";
}

/// The set of all valid share roles.
pub const VALID_SHARE_ROLES: &[&str] = &[share_roles::VIEWER, share_roles::EDITOR];

/// Returns `true` if the given role is a valid share role.
pub fn is_valid_share_role(role: &str) -> bool {
    VALID_SHARE_ROLES.contains(&role)
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// The caller, as seen by access checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: DbId,
    /// Already-normalized (lowercased) account email.
    pub email: String,
}

/// One collaborator entry on a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEntry {
    /// Normalized (lowercased) invite email.
    pub email: String,
    pub role: String,
    /// Resolved lazily once the invitee's account exists.
    pub user_id: Option<DbId>,
}

/// The slice of a plan row the predicates need.
#[derive(Debug, Clone)]
pub struct PlanAccess {
    pub creator_id: DbId,
    pub is_public: bool,
}

/// Lowercase-trim an email for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn entry_matches(entry: &ShareEntry, principal: &Principal) -> bool {
    entry.user_id == Some(principal.user_id) || entry.email == principal.email
}

// ---------------------------------------------------------------------------
// Capability predicates
// ---------------------------------------------------------------------------

/// `is_public OR creator OR caller id/email appears in the share list`.
pub fn can_view(plan: &PlanAccess, shares: &[ShareEntry], principal: &Principal) -> bool {
    plan.is_public
        || plan.creator_id == principal.user_id
        || shares.iter().any(|s| entry_matches(s, principal))
}

/// `creator OR (share matches AND role == editor)`.
pub fn can_edit(plan: &PlanAccess, shares: &[ShareEntry], principal: &Principal) -> bool {
    plan.creator_id == principal.user_id
        || shares
            .iter()
            .any(|s| entry_matches(s, principal) && s.role == share_roles::EDITOR)
}

/// Sharing requires edit capability; viewers may not share.
pub fn can_share(plan: &PlanAccess, shares: &[ShareEntry], principal: &Principal) -> bool {
    can_edit(plan, shares, principal)
}

/// The creator removes anyone; a collaborator removes only themselves.
pub fn can_remove_share(plan: &PlanAccess, principal: &Principal, target_user_id: DbId) -> bool {
    plan.creator_id == principal.user_id || principal.user_id == target_user_id
}

// ---------------------------------------------------------------------------
// Share-request validation
// ---------------------------------------------------------------------------

/// Validate a share request against the plan's current state.
///
/// Returns the normalized target email. Rejects an invalid role, sharing
/// with the creator's own email, and duplicate shares (case-insensitive).
pub fn validate_share_request(
    creator_email: &str,
    existing: &[ShareEntry],
    target_email: &str,
    role: &str,
) -> Result<String, CoreError> {
    if !is_valid_share_role(role) {
        return Err(CoreError::Validation(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_SHARE_ROLES.join(", ")
        )));
    }

    let email = normalize_email(target_email);
    if email.is_empty() || !email.contains('@') {
        return Err(CoreError::Validation(format!(
            "'{target_email}' is not a valid email address"
        )));
    }

    if email == normalize_email(creator_email) {
        return Err(CoreError::Validation(
            "Cannot share a plan with its creator".into(),
        ));
    }

    if existing.iter().any(|s| s.email == email) {
        return Err(CoreError::Conflict(format!(
            "Plan is already shared with {email}"
        )));
    }

    Ok(email)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(creator_id: DbId, is_public: bool) -> PlanAccess {
        PlanAccess {
            creator_id,
            is_public,
        }
    }

    fn principal(user_id: DbId, email: &str) -> Principal {
        Principal {
            user_id,
            email: email.to_string(),
        }
    }

    fn entry(email: &str, role: &str, user_id: Option<DbId>) -> ShareEntry {
        ShareEntry {
            email: email.to_string(),
            role: role.to_string(),
            user_id,
        }
    }

    // -- role validation --

    #[test]
    fn valid_share_roles() {
        assert!(is_valid_share_role("viewer"));
        assert!(is_valid_share_role("editor"));
    }

    #[test]
    fn invalid_share_roles() {
        assert!(!is_valid_share_role(""));
        assert!(!is_valid_share_role("owner"));
        assert!(!is_valid_share_role("Editor"));
    }

    // -- can_view --

    #[test]
    fn creator_can_view() {
        assert!(can_view(&plan(1, false), &[], &principal(1, "a@x.io")));
    }

    #[test]
    fn public_plan_viewable_by_anyone() {
        assert!(can_view(&plan(1, true), &[], &principal(99, "z@x.io")));
    }

    #[test]
    fn private_plan_hidden_from_strangers() {
        assert!(!can_view(&plan(1, false), &[], &principal(99, "z@x.io")));
    }

    #[test]
    fn share_by_user_id_grants_view() {
        let shares = [entry("b@x.io", "viewer", Some(2))];
        assert!(can_view(&plan(1, false), &shares, &principal(2, "other@x.io")));
    }

    #[test]
    fn share_by_email_only_grants_view() {
        // Invitee registered after the share: user_id still unresolved.
        let shares = [entry("b@x.io", "viewer", None)];
        assert!(can_view(&plan(1, false), &shares, &principal(2, "b@x.io")));
    }

    // -- can_edit --

    #[test]
    fn creator_can_edit() {
        assert!(can_edit(&plan(1, false), &[], &principal(1, "a@x.io")));
    }

    #[test]
    fn editor_share_can_edit() {
        let shares = [entry("b@x.io", "editor", Some(2))];
        assert!(can_edit(&plan(1, false), &shares, &principal(2, "b@x.io")));
    }

    #[test]
    fn viewer_share_cannot_edit() {
        let shares = [entry("b@x.io", "viewer", Some(2))];
        assert!(!can_edit(&plan(1, false), &shares, &principal(2, "b@x.io")));
    }

    #[test]
    fn public_does_not_imply_edit() {
        assert!(!can_edit(&plan(1, true), &[], &principal(99, "z@x.io")));
    }

    // -- can_share --

    #[test]
    fn viewers_cannot_share() {
        let shares = [entry("b@x.io", "viewer", Some(2))];
        assert!(!can_share(&plan(1, false), &shares, &principal(2, "b@x.io")));
    }

    #[test]
    fn editors_can_share() {
        let shares = [entry("b@x.io", "editor", Some(2))];
        assert!(can_share(&plan(1, false), &shares, &principal(2, "b@x.io")));
    }

    // -- can_remove_share --

    #[test]
    fn creator_removes_anyone() {
        assert!(can_remove_share(&plan(1, false), &principal(1, "a@x.io"), 2));
    }

    #[test]
    fn collaborator_removes_self_only() {
        assert!(can_remove_share(&plan(1, false), &principal(2, "b@x.io"), 2));
        assert!(!can_remove_share(&plan(1, false), &principal(2, "b@x.io"), 3));
    }

    // -- validate_share_request --

    #[test]
    fn share_request_normalizes_email() {
        let email = validate_share_request("a@x.io", &[], "  B@X.io ", "viewer").unwrap();
        assert_eq!(email, "b@x.io");
    }

    #[test]
    fn share_with_creator_rejected() {
        let result = validate_share_request("a@x.io", &[], "A@X.IO", "viewer");
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn duplicate_share_rejected_case_insensitive() {
        let existing = [entry("b@x.io", "viewer", None)];
        let result = validate_share_request("a@x.io", &existing, "B@x.IO", "editor");
        assert!(matches!(result, Err(CoreError::Conflict(_))));
    }

    #[test]
    fn invalid_role_rejected() {
        let result = validate_share_request("a@x.io", &[], "b@x.io", "owner");
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn malformed_email_rejected() {
        assert!(validate_share_request("a@x.io", &[], "not-an-email", "viewer").is_err());
        assert!(validate_share_request("a@x.io", &[], "   ", "viewer").is_err());
    }
}
