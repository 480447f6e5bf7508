//! Route definitions for the cron-triggered surface.

use axum::routing::get;
use axum::Router;

use crate::handlers::cron;
use crate::state::AppState;

/// Routes mounted at `/cron`.
///
/// Unauthenticated; protected by the optional `x-cron-secret` header.
pub fn router() -> Router<AppState> {
    Router::new().route("/reminders", get(cron::run_reminders))
}
