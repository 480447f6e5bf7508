//! Study-plan entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studyloom_core::sharing::ShareEntry;
use studyloom_core::types::{DbId, Timestamp};

/// A row from the `study_plans` table.
///
/// `instance_count` / `view_count` are advisory popularity signals; reads
/// clamp them to >= 0 at the query level, so serialized values are never
/// negative even if concurrent deletes drove the stored counter below zero.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudyPlan {
    pub id: DbId,
    pub title: String,
    pub course_code: Option<String>,
    pub description: Option<String>,
    pub creator_id: DbId,
    pub is_public: bool,
    pub instance_count: i64,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub updated_by: Option<DbId>,
}

/// A row from the `plan_shares` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlanShare {
    pub id: DbId,
    pub plan_id: DbId,
    pub email: String,
    pub role: String,
    pub user_id: Option<DbId>,
    pub shared_at: Timestamp,
}

impl PlanShare {
    /// The view the capability predicates operate on.
    pub fn to_entry(&self) -> ShareEntry {
        ShareEntry {
            email: self.email.clone(),
            role: self.role.clone(),
            user_id: self.user_id,
        }
    }
}

/// DTO for `POST /study-plans`.
#[derive(Debug, Deserialize)]
pub struct CreateStudyPlan {
    pub title: String,
    pub course_code: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    /// Initial ordered resource references.
    pub resource_ids: Option<Vec<DbId>>,
}

/// DTO for `PUT /study-plans/{id}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateStudyPlan {
    pub title: Option<String>,
    pub course_code: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    /// Replaces the ordered resource list when present. Existing instances
    /// keep their snapshots.
    pub resource_ids: Option<Vec<DbId>>,
}

/// DTO for `POST /study-plans/{id}/share`.
#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub email: String,
    pub role: String,
}
