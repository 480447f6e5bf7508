//! Repository for the `plan_shares` table.

use sqlx::PgPool;
use studyloom_core::types::DbId;

use crate::models::study_plan::PlanShare;

/// Column list for `plan_shares` queries.
const COLUMNS: &str = "id, plan_id, email, role, user_id, shared_at";

/// Provides the collaborator list attached to each plan.
pub struct PlanShareRepo;

impl PlanShareRepo {
    pub async fn list_for_plan(pool: &PgPool, plan_id: DbId) -> Result<Vec<PlanShare>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM plan_shares WHERE plan_id = $1 ORDER BY shared_at"
        );
        sqlx::query_as::<_, PlanShare>(&query)
            .bind(plan_id)
            .fetch_all(pool)
            .await
    }

    /// Insert a share entry. `email` must already be normalized; `user_id`
    /// is present when the invitee's account already exists.
    pub async fn create(
        pool: &PgPool,
        plan_id: DbId,
        email: &str,
        role: &str,
        user_id: Option<DbId>,
    ) -> Result<PlanShare, sqlx::Error> {
        let query = format!(
            "INSERT INTO plan_shares (plan_id, email, role, user_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PlanShare>(&query)
            .bind(plan_id)
            .bind(email)
            .bind(role)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Remove a collaborator by resolved user id.
    pub async fn delete_by_user(
        pool: &PgPool,
        plan_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM plan_shares WHERE plan_id = $1 AND user_id = $2")
            .bind(plan_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a not-yet-registered invite by normalized email.
    pub async fn delete_by_email(
        pool: &PgPool,
        plan_id: DbId,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM plan_shares WHERE plan_id = $1 AND email = $2")
            .bind(plan_id)
            .bind(email)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Backfill `user_id` on email-only entries once the invitee's account
    /// exists. Returns the number of entries claimed.
    pub async fn claim_for_user(
        pool: &PgPool,
        user_id: DbId,
        email: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE plan_shares SET user_id = $1 WHERE email = $2 AND user_id IS NULL",
        )
        .bind(user_id)
        .bind(email)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
