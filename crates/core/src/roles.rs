//! Account-level role names.
//!
//! Roles are stored as plain strings on the user row. Capability checks on
//! shared plans are separate (see [`crate::sharing`]); these roles gate the
//! admin-only surface (review moderation, resource deletion override).

/// Default role for every lazily-created account.
pub const ROLE_USER: &str = "user";

/// Moderation role: sees unapproved reviews, may delete any resource.
pub const ROLE_ADMIN: &str = "admin";

/// Returns `true` if the given role name is a known account role.
pub fn is_valid_role(role: &str) -> bool {
    role == ROLE_USER || role == ROLE_ADMIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_roles_are_valid() {
        assert!(is_valid_role("user"));
        assert!(is_valid_role("admin"));
    }

    #[test]
    fn unknown_roles_are_invalid() {
        assert!(!is_valid_role(""));
        assert!(!is_valid_role("moderator"));
        assert!(!is_valid_role("Admin"));
    }
}
