//! Plan-instance entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studyloom_core::reminders::ReminderRule;
use studyloom_core::types::{DbId, Timestamp};

/// A row from the `plan_instances` table.
///
/// `snapshot_resource_ids` is the plan's ordered resource list frozen at
/// creation time; later plan edits never touch it. `completed_resources`
/// is a denormalized display hint -- the `user_progress` ledger is the
/// source of truth and every read reconciles against it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlanInstance {
    pub id: DbId,
    pub plan_id: DbId,
    pub user_id: DbId,
    pub title: Option<String>,
    pub snapshot_resource_ids: Vec<DbId>,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub status: String,
    pub completed_resources: Vec<DbId>,
    /// jsonb array of [`ReminderRule`].
    pub reminders: serde_json::Value,
    pub reminder_time: Option<String>,
    pub resource_schedule: serde_json::Value,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PlanInstance {
    /// Parse the jsonb reminder rules; malformed payloads degrade to an
    /// empty set rather than failing the sweep.
    pub fn reminder_rules(&self) -> Vec<ReminderRule> {
        serde_json::from_value(self.reminders.clone()).unwrap_or_default()
    }
}

/// DTO for `POST /instances`.
#[derive(Debug, Deserialize)]
pub struct CreateInstance {
    pub plan_id: DbId,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub title: Option<String>,
    pub reminder_time: Option<String>,
    /// Explicit rule set; when absent, the caller's notification-settings
    /// rules (or the built-in defaults) are copied in.
    pub reminders: Option<Vec<ReminderRule>>,
    /// Optional per-resource target dates (`resource_id -> date`).
    pub resource_schedule: Option<serde_json::Value>,
}

/// DTO for `PUT /instances/{id}`.
///
/// This is the full allow-list: any other field in the request body is
/// silently ignored, not an error.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateInstance {
    pub title: Option<String>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub completed_resources: Option<Vec<DbId>>,
    pub reminders: Option<Vec<ReminderRule>>,
    pub reminder_time: Option<String>,
    pub resource_schedule: Option<serde_json::Value>,
}
