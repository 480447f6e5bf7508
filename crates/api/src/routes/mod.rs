pub mod admin;
pub mod cron;
pub mod health;
pub mod instance;
pub mod notification;
pub mod resource;
pub mod study_plan;
pub mod user_progress;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /study-plans                          list, create
/// /study-plans/{id}                     get, update, delete
/// /study-plans/{id}/share               share (POST), revoke invite (DELETE ?email=)
/// /study-plans/{id}/share/{user_id}     remove collaborator (DELETE)
/// /study-plans/{id}/reviews             list, submit
///
/// /resources                            list, normalize/create
/// /resources/bulk                       bulk fetch (?ids=csv)
/// /resources/{id}                       get, update, delete
///
/// /instances                            list, create (snapshots the plan)
/// /instances/{id}                       get, update, delete
///
/// /user-progress                        list, toggle
/// /user-progress/check                  completion map (?resource_ids=csv)
/// /user-progress/bulk                   bulk toggle
///
/// /users/me                             account + settings
///
/// /notifications/settings               get/update reminder settings
/// /notifications/test-email             send test email
///
/// /admin/reviews/{id}/approve           approve review (admin)
/// /admin/reviews/{id}                   delete review (admin)
///
/// /cron/reminders                       reminder sweep (external trigger)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Plans, sharing, and plan-scoped reviews.
        .nest("/study-plans", study_plan::router())
        // Resource normalizer and shared resource records.
        .nest("/resources", resource::router())
        // Personal plan instances with frozen snapshots.
        .nest("/instances", instance::router())
        // Global completion ledger.
        .nest("/user-progress", user_progress::router())
        // Account info.
        .nest("/users", users::router())
        // Reminder settings and test email.
        .nest("/notifications", notification::router())
        // Admin moderation.
        .nest("/admin", admin::router())
        // Externally-triggered reminder sweep.
        .nest("/cron", cron::router())
}
