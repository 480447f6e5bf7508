//! Repository for the `plan_instances` table.

use sqlx::PgPool;
use studyloom_core::types::{DbId, Timestamp};

use crate::models::instance::{PlanInstance, UpdateInstance};

/// Column list for `plan_instances` queries.
const COLUMNS: &str = "id, plan_id, user_id, title, snapshot_resource_ids, start_date, end_date, \
     status, completed_resources, reminders, reminder_time, resource_schedule, notes, \
     created_at, updated_at";

/// Provides the instance lifecycle: snapshot creation, allow-listed
/// updates, and the denormalized completion hint.
pub struct InstanceRepo;

impl InstanceRepo {
    /// Insert an instance with the plan's resource list frozen into
    /// `snapshot_resource_ids`.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        plan_id: DbId,
        title: Option<&str>,
        snapshot_resource_ids: &[DbId],
        start_date: Timestamp,
        end_date: Timestamp,
        reminders: &serde_json::Value,
        reminder_time: Option<&str>,
        resource_schedule: &serde_json::Value,
    ) -> Result<PlanInstance, sqlx::Error> {
        let query = format!(
            "INSERT INTO plan_instances \
             (user_id, plan_id, title, snapshot_resource_ids, start_date, end_date, \
              reminders, reminder_time, resource_schedule) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PlanInstance>(&query)
            .bind(user_id)
            .bind(plan_id)
            .bind(title)
            .bind(snapshot_resource_ids)
            .bind(start_date)
            .bind(end_date)
            .bind(reminders)
            .bind(reminder_time)
            .bind(resource_schedule)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PlanInstance>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM plan_instances WHERE id = $1");
        sqlx::query_as::<_, PlanInstance>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<PlanInstance>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM plan_instances \
             WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, PlanInstance>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Allow-listed partial update. The snapshot is deliberately absent:
    /// nothing mutates it after creation.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateInstance,
    ) -> Result<Option<PlanInstance>, sqlx::Error> {
        let reminders = input
            .reminders
            .as_ref()
            .and_then(|r| serde_json::to_value(r).ok());

        let query = format!(
            "UPDATE plan_instances \
             SET title = COALESCE($2, title), \
                 start_date = COALESCE($3, start_date), \
                 end_date = COALESCE($4, end_date), \
                 status = COALESCE($5, status), \
                 notes = COALESCE($6, notes), \
                 completed_resources = COALESCE($7, completed_resources), \
                 reminders = COALESCE($8, reminders), \
                 reminder_time = COALESCE($9, reminder_time), \
                 resource_schedule = COALESCE($10, resource_schedule), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PlanInstance>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.status)
            .bind(&input.notes)
            .bind(&input.completed_resources)
            .bind(reminders)
            .bind(&input.reminder_time)
            .bind(&input.resource_schedule)
            .fetch_optional(pool)
            .await
    }

    /// Delete an instance, returning its plan id (for the counter
    /// decrement) if it existed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar("DELETE FROM plan_instances WHERE id = $1 RETURNING plan_id")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Push a resource id into the denormalized completion hint,
    /// deduplicated.
    pub async fn add_completed(
        pool: &PgPool,
        id: DbId,
        resource_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE plan_instances \
             SET completed_resources = array_append(completed_resources, $2), updated_at = NOW() \
             WHERE id = $1 AND NOT (completed_resources @> ARRAY[$2]::bigint[])",
        )
        .bind(id)
        .bind(resource_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Pull a resource id from the denormalized completion hint.
    pub async fn remove_completed(
        pool: &PgPool,
        id: DbId,
        resource_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE plan_instances \
             SET completed_resources = array_remove(completed_resources, $2), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(resource_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Overwrite the completion hint with the ledger-reconciled set
    /// (opportunistic re-cache on read).
    pub async fn set_completed(
        pool: &PgPool,
        id: DbId,
        resource_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE plan_instances SET completed_resources = $2 WHERE id = $1")
            .bind(id)
            .bind(resource_ids)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Active instances whose deadline has not yet passed -- the reminder
    /// sweep's working set.
    pub async fn list_active_due(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<PlanInstance>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM plan_instances \
             WHERE status = $2 AND end_date >= $1 \
             ORDER BY end_date"
        );
        sqlx::query_as::<_, PlanInstance>(&query)
            .bind(now)
            .bind(studyloom_core::instances::statuses::ACTIVE)
            .fetch_all(pool)
            .await
    }
}
