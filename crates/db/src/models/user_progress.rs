//! Completion-ledger models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studyloom_core::types::{DbId, Timestamp};

/// A row from the `user_progress` table -- the single source of truth for
/// "is resource X done by user Y". Unique per `(user_id, resource_id)`;
/// completion is global per user, not instance-scoped.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProgress {
    pub id: DbId,
    pub user_id: DbId,
    pub resource_id: DbId,
    pub instance_id: Option<DbId>,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for `POST /user-progress`.
#[derive(Debug, Deserialize)]
pub struct ToggleProgress {
    pub resource_id: DbId,
    /// The instance whose denormalized hint array should absorb this
    /// toggle. Other instances reconcile from the ledger on read.
    pub instance_id: Option<DbId>,
    pub completed: bool,
}

/// DTO for `POST /user-progress/bulk`.
#[derive(Debug, Deserialize)]
pub struct BulkToggle {
    pub resource_ids: Vec<DbId>,
    pub instance_id: Option<DbId>,
    pub completed: bool,
}

/// Per-item outcome in a bulk toggle response (fail-soft: one item's
/// failure never aborts the batch).
#[derive(Debug, Serialize)]
pub struct BulkToggleResult {
    pub resource_id: DbId,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
