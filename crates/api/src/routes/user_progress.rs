//! Route definitions for the `/user-progress` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::user_progress;
use crate::state::AppState;

/// Routes mounted at `/user-progress`.
///
/// ```text
/// GET    /         -> list_progress
/// POST   /         -> toggle_progress
/// GET    /check    -> check_progress (?resource_ids=csv)
/// POST   /bulk     -> bulk_toggle_progress (fail-soft per item)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(user_progress::list_progress).post(user_progress::toggle_progress),
        )
        .route("/check", get(user_progress::check_progress))
        .route("/bulk", post(user_progress::bulk_toggle_progress))
}
