//! Repository for the `reviews` table.

use sqlx::PgPool;
use studyloom_core::types::DbId;

use crate::models::review::Review;

/// Column list for `reviews` queries.
const COLUMNS: &str = "id, plan_id, user_id, rating, comment, is_approved, created_at, updated_at";

/// Provides review upserts and admin moderation.
pub struct ReviewRepo;

impl ReviewRepo {
    /// Upsert a user's review of a plan. Re-submitting resets the review
    /// to unapproved so edited content passes moderation again.
    pub async fn upsert(
        pool: &PgPool,
        plan_id: DbId,
        user_id: DbId,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Review, sqlx::Error> {
        let query = format!(
            "INSERT INTO reviews (plan_id, user_id, rating, comment) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (plan_id, user_id) DO UPDATE \
             SET rating = $3, comment = $4, is_approved = FALSE, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Review>(&query)
            .bind(plan_id)
            .bind(user_id)
            .bind(rating)
            .bind(comment)
            .fetch_one(pool)
            .await
    }

    /// List a plan's reviews. Non-admin callers see approved reviews only.
    pub async fn list_for_plan(
        pool: &PgPool,
        plan_id: DbId,
        include_unapproved: bool,
    ) -> Result<Vec<Review>, sqlx::Error> {
        let filter = if include_unapproved {
            ""
        } else {
            "AND is_approved"
        };
        let query = format!(
            "SELECT {COLUMNS} FROM reviews \
             WHERE plan_id = $1 {filter} \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Review>(&query)
            .bind(plan_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Review>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reviews WHERE id = $1");
        sqlx::query_as::<_, Review>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Approve a review for public display.
    pub async fn approve(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE reviews SET is_approved = TRUE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
