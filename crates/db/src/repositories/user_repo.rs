//! Repository for the `users` and `user_notification_settings` tables.

use sqlx::PgPool;
use studyloom_core::types::DbId;

use crate::models::user::{NotificationSettings, UpdateNotificationSettings, User};

/// Column list for `users` queries.
const COLUMNS: &str = "id, provider_uid, email, display_name, role, created_at, updated_at";

/// Column list for `user_notification_settings` queries.
const SETTINGS_COLUMNS: &str = "id, user_id, email_reminders_enabled, reminder_time, frequency, \
     custom_days, custom_reminders, created_at, updated_at";

/// Provides account lookup and the lazy-creation upsert.
pub struct UserRepo;

impl UserRepo {
    /// Upsert an account by identity-provider uid.
    ///
    /// Called on every authenticated request; the first call for a new uid
    /// creates the row, later calls refresh email and display name from
    /// the token. `email` must already be normalized (lowercased).
    pub async fn ensure(
        pool: &PgPool,
        provider_uid: &str,
        email: &str,
        display_name: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (provider_uid, email, display_name) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (provider_uid) DO UPDATE \
             SET email = EXCLUDED.email, \
                 display_name = EXCLUDED.display_name, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(provider_uid)
            .bind(email)
            .bind(display_name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look up an account by normalized email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Fetch the user's notification settings, creating the default row on
    /// first access.
    pub async fn settings_for(pool: &PgPool, user_id: DbId) -> Result<NotificationSettings, sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_notification_settings (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        let query =
            format!("SELECT {SETTINGS_COLUMNS} FROM user_notification_settings WHERE user_id = $1");
        sqlx::query_as::<_, NotificationSettings>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Partial update of notification settings; absent fields unchanged.
    pub async fn update_settings(
        pool: &PgPool,
        user_id: DbId,
        input: &UpdateNotificationSettings,
    ) -> Result<NotificationSettings, sqlx::Error> {
        // Make sure the row exists before the partial update.
        Self::settings_for(pool, user_id).await?;

        let query = format!(
            "UPDATE user_notification_settings \
             SET email_reminders_enabled = COALESCE($2, email_reminders_enabled), \
                 reminder_time = COALESCE($3, reminder_time), \
                 frequency = COALESCE($4, frequency), \
                 custom_days = COALESCE($5, custom_days), \
                 custom_reminders = COALESCE($6, custom_reminders), \
                 updated_at = NOW() \
             WHERE user_id = $1 \
             RETURNING {SETTINGS_COLUMNS}"
        );
        sqlx::query_as::<_, NotificationSettings>(&query)
            .bind(user_id)
            .bind(input.email_reminders_enabled)
            .bind(&input.reminder_time)
            .bind(&input.frequency)
            .bind(&input.custom_days)
            .bind(&input.custom_reminders)
            .fetch_one(pool)
            .await
    }
}
