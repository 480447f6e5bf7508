//! Route definitions for the admin moderation surface.
//!
//! All handlers here gate on [`crate::middleware::rbac::RequireAdmin`].

use axum::routing::{delete, put};
use axum::Router;

use crate::handlers::review;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// PUT    /reviews/{id}/approve  -> approve_review
/// DELETE /reviews/{id}          -> delete_review
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reviews/{id}/approve", put(review::approve_review))
        .route("/reviews/{id}", delete(review::delete_review))
}
