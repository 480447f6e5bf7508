//! Instance lifecycle rules.
//!
//! An instance is one user's time-boxed run of a plan. Its resource set is
//! frozen at creation (the snapshot); only dates, status, notes, and
//! reminder configuration change afterwards.

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

/// Known instance statuses.
pub mod statuses {
    pub const ACTIVE: &str = "active";
    pub const PAUSED: &str = "paused";
    pub const COMPLETED: &str = "completed";
    pub const ABANDONED: &str = "abandoned";
}

/// The set of all valid instance statuses.
pub const VALID_STATUSES: &[&str] = &[
    statuses::ACTIVE,
    statuses::PAUSED,
    statuses::COMPLETED,
    statuses::ABANDONED,
];

/// Returns `true` if the given status is valid for an instance.
pub fn is_valid_status(status: &str) -> bool {
    VALID_STATUSES.contains(&status)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// An instance's date range must be strictly ordered.
pub fn validate_date_range(start: Timestamp, end: Timestamp) -> Result<(), CoreError> {
    if start >= end {
        return Err(CoreError::Validation(
            "start_date must be before end_date".into(),
        ));
    }
    Ok(())
}

/// Validate a status string.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if !is_valid_status(status) {
        return Err(CoreError::Validation(format!(
            "Invalid status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn valid_statuses() {
        assert!(is_valid_status("active"));
        assert!(is_valid_status("paused"));
        assert!(is_valid_status("completed"));
        assert!(is_valid_status("abandoned"));
    }

    #[test]
    fn invalid_statuses() {
        assert!(!is_valid_status(""));
        assert!(!is_valid_status("done"));
        assert!(!is_valid_status("Active"));
    }

    #[test]
    fn ordered_range_accepted() {
        let start = Utc::now();
        assert!(validate_date_range(start, start + Duration::days(30)).is_ok());
    }

    #[test]
    fn equal_dates_rejected() {
        let start = Utc::now();
        assert!(validate_date_range(start, start).is_err());
    }

    #[test]
    fn inverted_range_rejected() {
        let start = Utc::now();
        assert!(validate_date_range(start, start - Duration::days(1)).is_err());
    }

    #[test]
    fn validate_status_message_lists_options() {
        let err = validate_status("done").unwrap_err();
        assert!(err.to_string().contains("active"));
    }
}
