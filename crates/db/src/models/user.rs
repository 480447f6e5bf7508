//! User entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studyloom_core::types::{DbId, Timestamp};

/// A row from the `users` table.
///
/// Accounts are created lazily on the first authenticated request carrying
/// an unknown identity-provider uid.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub provider_uid: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `user_notification_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NotificationSettings {
    pub id: DbId,
    pub user_id: DbId,
    pub email_reminders_enabled: bool,
    /// Preferred delivery time of day, `HH:MM`.
    pub reminder_time: String,
    pub frequency: String,
    /// Days of week for `frequency = "custom"`, 0 = Sunday.
    pub custom_days: Vec<i32>,
    /// Reminder rules copied onto new instances (jsonb array of
    /// `ReminderRule`).
    pub custom_reminders: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for partial updates to notification settings.
#[derive(Debug, Deserialize)]
pub struct UpdateNotificationSettings {
    pub email_reminders_enabled: Option<bool>,
    pub reminder_time: Option<String>,
    pub frequency: Option<String>,
    pub custom_days: Option<Vec<i32>>,
    pub custom_reminders: Option<serde_json::Value>,
}
