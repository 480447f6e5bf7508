//! Review entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studyloom_core::types::{DbId, Timestamp};

/// A row from the `reviews` table. Unapproved rows are visible to admins
/// only; editing a review resets it to unapproved.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Review {
    pub id: DbId,
    pub plan_id: DbId,
    pub user_id: DbId,
    pub rating: i32,
    pub comment: Option<String>,
    pub is_approved: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for `POST /study-plans/{id}/reviews` (upsert: one review per user
/// per plan).
#[derive(Debug, Deserialize)]
pub struct CreateReview {
    pub rating: i32,
    pub comment: Option<String>,
}
