//! Repository for the `user_progress` table -- the global completion ledger.

use sqlx::PgPool;
use studyloom_core::types::DbId;

use crate::models::user_progress::UserProgress;

/// Column list for `user_progress` queries.
const COLUMNS: &str =
    "id, user_id, resource_id, instance_id, completed, completed_at, created_at, updated_at";

/// Provides the upsert-only completion ledger. Completion is global per
/// (user, resource); the originating instance is recorded for attribution
/// only.
pub struct UserProgressRepo;

impl UserProgressRepo {
    /// Upsert a completion toggle.
    ///
    /// Writing `completed = true` stamps a fresh `completed_at`; writing
    /// `false` clears it. The `(user_id, resource_id)` unique key makes
    /// repeated toggles converge on the latest write.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        resource_id: DbId,
        instance_id: Option<DbId>,
        completed: bool,
    ) -> Result<UserProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_progress (user_id, resource_id, instance_id, completed, completed_at) \
             VALUES ($1, $2, $3, $4, CASE WHEN $4 THEN NOW() END) \
             ON CONFLICT (user_id, resource_id) DO UPDATE \
             SET completed = $4, \
                 completed_at = CASE WHEN $4 THEN NOW() END, \
                 instance_id = COALESCE($3, user_progress.instance_id), \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserProgress>(&query)
            .bind(user_id)
            .bind(resource_id)
            .bind(instance_id)
            .bind(completed)
            .fetch_one(pool)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        user_id: DbId,
        resource_id: DbId,
    ) -> Result<Option<UserProgress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_progress WHERE user_id = $1 AND resource_id = $2"
        );
        sqlx::query_as::<_, UserProgress>(&query)
            .bind(user_id)
            .bind(resource_id)
            .fetch_optional(pool)
            .await
    }

    /// All ledger entries for a user, most recently touched first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<UserProgress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_progress \
             WHERE user_id = $1 ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, UserProgress>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// The subset of `resource_ids` the ledger marks complete for this
    /// user.
    pub async fn completed_ids(
        pool: &PgPool,
        user_id: DbId,
        resource_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT resource_id FROM user_progress \
             WHERE user_id = $1 AND completed AND resource_id = ANY($2)",
        )
        .bind(user_id)
        .bind(resource_ids)
        .fetch_all(pool)
        .await
    }

    /// Every resource id the ledger marks complete for this user.
    pub async fn all_completed_ids(pool: &PgPool, user_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT resource_id FROM user_progress WHERE user_id = $1 AND completed",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
