//! Reminder rules and fire-window evaluation.
//!
//! Every active instance carries a set of reminder rules, copied from the
//! owner's notification settings at creation time (an explicit per-instance
//! set overrides the copy, rule-by-rule, keyed on rule id). A rule fires
//! when the current time falls inside the strict bracket
//! `[deadline - offset, deadline]`; outside it the rule is skipped. If the
//! sweep cadence exceeds a rule's lead time the bracket can be skipped
//! entirely -- a known gap, documented rather than compensated for.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minutes per day, for offset arithmetic.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Largest accepted reminder lead time (60 days).
pub const MAX_OFFSET_MINS: i64 = 60 * MINUTES_PER_DAY;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// One reminder rule: "email me `offset_mins` before the deadline".
///
/// The id keys the at-most-once `sent_reminders` log, so it must be stable
/// for the lifetime of the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRule {
    pub id: String,
    pub label: String,
    pub offset_mins: i64,
}

/// Built-in rules used when a user has no custom reminders configured.
pub fn default_rules() -> Vec<ReminderRule> {
    vec![
        ReminderRule {
            id: "due-7d".to_string(),
            label: "One week before deadline".to_string(),
            offset_mins: 7 * MINUTES_PER_DAY,
        },
        ReminderRule {
            id: "due-3d".to_string(),
            label: "Three days before deadline".to_string(),
            offset_mins: 3 * MINUTES_PER_DAY,
        },
        ReminderRule {
            id: "due-1d".to_string(),
            label: "One day before deadline".to_string(),
            offset_mins: MINUTES_PER_DAY,
        },
    ]
}

/// Create a custom rule with a fresh unique id.
pub fn new_custom_rule(label: &str, offset_mins: i64) -> Result<ReminderRule, CoreError> {
    validate_offset(offset_mins)?;
    Ok(ReminderRule {
        id: uuid::Uuid::new_v4().to_string(),
        label: label.trim().to_string(),
        offset_mins,
    })
}

/// Validate a rule's lead time.
pub fn validate_offset(offset_mins: i64) -> Result<(), CoreError> {
    if offset_mins <= 0 {
        return Err(CoreError::Validation(format!(
            "Reminder offset must be positive, got {offset_mins}"
        )));
    }
    if offset_mins > MAX_OFFSET_MINS {
        return Err(CoreError::Validation(format!(
            "Reminder offset must be at most {MAX_OFFSET_MINS} minutes, got {offset_mins}"
        )));
    }
    Ok(())
}

/// Validate every rule in a caller-supplied set (ids must be non-empty and
/// unique within the set).
pub fn validate_rules(rules: &[ReminderRule]) -> Result<(), CoreError> {
    let mut seen = std::collections::HashSet::new();
    for rule in rules {
        if rule.id.trim().is_empty() {
            return Err(CoreError::Validation("Reminder rule id must not be empty".into()));
        }
        if !seen.insert(rule.id.as_str()) {
            return Err(CoreError::Conflict(format!(
                "Duplicate reminder rule id '{}'",
                rule.id
            )));
        }
        validate_offset(rule.offset_mins)?;
    }
    Ok(())
}

/// Merge instance-level rules over user-level ones.
///
/// Rules sharing an id resolve to the instance's version; the rest of both
/// sets are kept. Instance rules come first in the result.
pub fn merge_rules(instance: &[ReminderRule], user: &[ReminderRule]) -> Vec<ReminderRule> {
    let mut merged: Vec<ReminderRule> = instance.to_vec();
    for rule in user {
        if !instance.iter().any(|r| r.id == rule.id) {
            merged.push(rule.clone());
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Fire window
// ---------------------------------------------------------------------------

/// `true` when `deadline - offset <= now <= deadline` -- the rule's one and
/// only fire window. Both bounds are inclusive.
pub fn is_due(now: Timestamp, deadline: Timestamp, offset_mins: i64) -> bool {
    let target = deadline - Duration::minutes(offset_mins);
    now >= target && now <= deadline
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(s: &str) -> Timestamp {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .unwrap()
            .and_utc()
    }

    fn rule(id: &str, offset_mins: i64) -> ReminderRule {
        ReminderRule {
            id: id.to_string(),
            label: id.to_string(),
            offset_mins,
        }
    }

    // -- fire window --

    #[test]
    fn fires_exactly_at_window_open() {
        let deadline = at("2026-03-10 12:00");
        // offset 1 day: window opens at 2026-03-09 12:00.
        assert!(is_due(at("2026-03-09 12:00"), deadline, MINUTES_PER_DAY));
    }

    #[test]
    fn silent_before_window() {
        let deadline = at("2026-03-10 12:00");
        assert!(!is_due(at("2026-03-09 11:59"), deadline, MINUTES_PER_DAY));
    }

    #[test]
    fn fires_inside_window() {
        let deadline = at("2026-03-10 12:00");
        assert!(is_due(at("2026-03-10 00:00"), deadline, MINUTES_PER_DAY));
    }

    #[test]
    fn fires_exactly_at_deadline() {
        let deadline = at("2026-03-10 12:00");
        assert!(is_due(deadline, deadline, MINUTES_PER_DAY));
    }

    #[test]
    fn silent_after_deadline() {
        let deadline = at("2026-03-10 12:00");
        assert!(!is_due(at("2026-03-10 12:01"), deadline, MINUTES_PER_DAY));
    }

    // -- defaults --

    #[test]
    fn default_rules_have_unique_ids_and_valid_offsets() {
        let rules = default_rules();
        assert!(validate_rules(&rules).is_ok());
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn default_offsets_descend() {
        let rules = default_rules();
        assert!(rules.windows(2).all(|w| w[0].offset_mins > w[1].offset_mins));
    }

    // -- custom rules --

    #[test]
    fn custom_rule_gets_unique_id() {
        let a = new_custom_rule("soon", 60).unwrap();
        let b = new_custom_rule("soon", 60).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.offset_mins, 60);
    }

    #[test]
    fn custom_rule_rejects_bad_offsets() {
        assert!(new_custom_rule("x", 0).is_err());
        assert!(new_custom_rule("x", -10).is_err());
        assert!(new_custom_rule("x", MAX_OFFSET_MINS + 1).is_err());
    }

    // -- rule-set validation --

    #[test]
    fn duplicate_rule_ids_rejected() {
        let rules = vec![rule("a", 60), rule("a", 120)];
        assert!(matches!(
            validate_rules(&rules),
            Err(CoreError::Conflict(_))
        ));
    }

    #[test]
    fn empty_rule_id_rejected() {
        let rules = vec![rule("", 60)];
        assert!(validate_rules(&rules).is_err());
    }

    // -- merge --

    #[test]
    fn instance_rules_shadow_user_rules_by_id() {
        let instance = vec![rule("due-1d", 2 * MINUTES_PER_DAY)];
        let user = vec![rule("due-1d", MINUTES_PER_DAY), rule("due-7d", 7 * MINUTES_PER_DAY)];

        let merged = merge_rules(&instance, &user);
        assert_eq!(merged.len(), 2);
        // The instance's due-1d wins.
        let winner = merged.iter().find(|r| r.id == "due-1d").unwrap();
        assert_eq!(winner.offset_mins, 2 * MINUTES_PER_DAY);
        assert!(merged.iter().any(|r| r.id == "due-7d"));
    }

    #[test]
    fn merge_with_empty_instance_keeps_user_rules() {
        let user = default_rules();
        let merged = merge_rules(&[], &user);
        assert_eq!(merged, user);
    }

    #[test]
    fn merge_with_empty_user_keeps_instance_rules() {
        let instance = vec![rule("custom", 90)];
        let merged = merge_rules(&instance, &[]);
        assert_eq!(merged, instance);
    }
}
