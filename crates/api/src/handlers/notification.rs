//! Handlers for `/notifications` -- per-user reminder settings and the
//! test-email endpoint.

use axum::extract::State;
use axum::Json;
use chrono::NaiveTime;

use studyloom_core::error::CoreError;
use studyloom_core::reminders::{validate_rules, ReminderRule};
use studyloom_db::models::user::{NotificationSettings, UpdateNotificationSettings};
use studyloom_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

/// Accepted values for the reminder frequency field.
const VALID_FREQUENCIES: &[&str] = &["daily", "weekly", "custom"];

/// GET /api/v1/notifications/settings
///
/// The caller's reminder configuration, created with defaults on first
/// access.
pub async fn get_settings(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<NotificationSettings>>> {
    let settings = UserRepo::settings_for(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: settings }))
}

/// PUT /api/v1/notifications/settings
///
/// Partial update; absent fields are left unchanged.
pub async fn update_settings(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateNotificationSettings>,
) -> AppResult<Json<MessageResponse<NotificationSettings>>> {
    if let Some(frequency) = &input.frequency {
        if !VALID_FREQUENCIES.contains(&frequency.as_str()) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid frequency '{frequency}'. Must be one of: {}",
                VALID_FREQUENCIES.join(", ")
            ))));
        }
    }

    if let Some(time) = &input.reminder_time {
        if NaiveTime::parse_from_str(time, "%H:%M").is_err() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid reminder_time '{time}'. Expected HH:MM"
            ))));
        }
    }

    if let Some(days) = &input.custom_days {
        if days.iter().any(|d| !(0..=6).contains(d)) {
            return Err(AppError::Core(CoreError::Validation(
                "custom_days entries must be 0 (Sunday) through 6 (Saturday)".into(),
            )));
        }
    }

    if let Some(raw) = &input.custom_reminders {
        let rules: Vec<ReminderRule> = serde_json::from_value(raw.clone()).map_err(|e| {
            AppError::Core(CoreError::Validation(format!(
                "custom_reminders is not a valid rule list: {e}"
            )))
        })?;
        validate_rules(&rules)?;
    }

    let settings = UserRepo::update_settings(&state.pool, auth.user_id, &input).await?;

    tracing::info!(user_id = auth.user_id, "Notification settings updated");

    Ok(Json(MessageResponse {
        message: "Notification settings updated".to_string(),
        data: settings,
    }))
}

/// POST /api/v1/notifications/test-email
///
/// Send a test message to the caller's own address so they can verify
/// their SMTP path end to end.
pub async fn test_email(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let mailer = state.mailer.as_ref().ok_or(AppError::Core(CoreError::Validation(
        "SMTP is not configured on this server (set SMTP_HOST)".into(),
    )))?;

    mailer
        .send(
            &auth.email,
            "[Studyloom] Test email",
            "This is a test email from your Studyloom reminder settings. \
             If you can read this, delivery works.",
        )
        .await
        .map_err(|e| AppError::Core(CoreError::External(e.to_string())))?;

    Ok(Json(serde_json::json!({
        "message": format!("Test email sent to {}", auth.email)
    })))
}
