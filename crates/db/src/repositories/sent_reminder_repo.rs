//! Repository for the `sent_reminders` at-most-once delivery log.

use sqlx::PgPool;
use studyloom_core::types::DbId;

use crate::models::sent_reminder::SentReminder;

/// Column list for `sent_reminders` queries.
const COLUMNS: &str = "id, instance_id, rule_id, sent_at";

/// Provides the idempotency log consulted by the reminder sweep.
pub struct SentReminderRepo;

impl SentReminderRepo {
    /// Record a delivery. Returns `false` when the `(instance, rule)` pair
    /// was already logged -- a concurrent sweep won the race and this
    /// caller's send was a duplicate.
    pub async fn record(pool: &PgPool, instance_id: DbId, rule_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO sent_reminders (instance_id, rule_id) VALUES ($1, $2) \
             ON CONFLICT (instance_id, rule_id) DO NOTHING",
        )
        .bind(instance_id)
        .bind(rule_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Has this `(instance, rule)` pair already been delivered?
    pub async fn was_sent(
        pool: &PgPool,
        instance_id: DbId,
        rule_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sent_reminders WHERE instance_id = $1 AND rule_id = $2",
        )
        .bind(instance_id)
        .bind(rule_id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn list_for_instance(
        pool: &PgPool,
        instance_id: DbId,
    ) -> Result<Vec<SentReminder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sent_reminders WHERE instance_id = $1 ORDER BY sent_at"
        );
        sqlx::query_as::<_, SentReminder>(&query)
            .bind(instance_id)
            .fetch_all(pool)
            .await
    }
}
