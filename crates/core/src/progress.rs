//! Completion and time aggregation over a resource set.
//!
//! The global `user_progress` ledger is the single source of truth for
//! "is resource X done by user Y". Everything here is a request-scoped
//! derived value: summaries are recomputed on every read and never
//! persisted, so a stale read between storage round trips can only produce
//! a momentarily stale display, not a corrupted invariant. Denormalized
//! per-instance `completed_resources` arrays are display hints and must be
//! reconciled against the ledger via [`reconcile_completed`] before use.

use std::collections::HashSet;

use serde::Serialize;

use crate::resources::{duration_minutes, ResourceMetadata};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Input view
// ---------------------------------------------------------------------------

/// The slice of a resource row the aggregator needs.
#[derive(Debug, Clone)]
pub struct ResourceView {
    pub id: DbId,
    pub resource_type: String,
    pub metadata: ResourceMetadata,
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Per-instance (or per-plan) progress figures, all derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub total_resources: i64,
    pub completed_resources: i64,
    /// `round(100 * completed / total)`, 0 when there are no resources.
    pub resource_percent: i64,
    pub total_minutes: i64,
    pub completed_minutes: i64,
    pub remaining_minutes: i64,
    /// `round(100 * completed_minutes / total_minutes)`, 0 when the total
    /// time is 0.
    pub time_percent: i64,
}

/// Rounded percentage with a zero-division guard.
pub fn percent(part: i64, whole: i64) -> i64 {
    if whole == 0 {
        return 0;
    }
    (100.0 * part as f64 / whole as f64).round() as i64
}

/// Aggregate completion figures for a resource set against the set of
/// ledger-completed resource ids.
pub fn summarize(resources: &[ResourceView], completed_ids: &HashSet<DbId>) -> ProgressSummary {
    let total_resources = resources.len() as i64;
    let mut completed_resources = 0i64;
    let mut total_minutes = 0i64;
    let mut completed_minutes = 0i64;

    for resource in resources {
        let minutes = duration_minutes(&resource.resource_type, &resource.metadata);
        total_minutes += minutes;
        if completed_ids.contains(&resource.id) {
            completed_resources += 1;
            completed_minutes += minutes;
        }
    }

    ProgressSummary {
        total_resources,
        completed_resources,
        resource_percent: percent(completed_resources, total_resources),
        total_minutes,
        completed_minutes,
        remaining_minutes: total_minutes - completed_minutes,
        time_percent: percent(completed_minutes, total_minutes),
    }
}

/// Reconcile a cached `completed_resources` hint against the ledger.
///
/// Returns the ids from `snapshot` that the ledger marks complete, in
/// snapshot order. The cached array is ignored entirely; callers may
/// re-cache the result opportunistically.
pub fn reconcile_completed(snapshot: &[DbId], completed_ids: &HashSet<DbId>) -> Vec<DbId> {
    snapshot
        .iter()
        .copied()
        .filter(|id| completed_ids.contains(id))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
