//! At-most-once reminder delivery log.

use serde::Serialize;
use sqlx::FromRow;
use studyloom_core::types::{DbId, Timestamp};

/// A row from the `sent_reminders` table. The unique `(instance_id,
/// rule_id)` pair is what makes the reminder sweep idempotent.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SentReminder {
    pub id: DbId,
    pub instance_id: DbId,
    pub rule_id: String,
    pub sent_at: Timestamp,
}
