//! Route definitions for the `/notifications` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET /settings      -> get_settings
/// PUT /settings      -> update_settings
/// POST /test-email   -> test_email
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/settings",
            get(notification::get_settings).put(notification::update_settings),
        )
        .route("/test-email", post(notification::test_email))
}
