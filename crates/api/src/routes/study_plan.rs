//! Route definitions for the `/study-plans` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{review, study_plan};
use crate::state::AppState;

/// Routes mounted at `/study-plans`.
///
/// ```text
/// GET    /                        -> list_plans
/// POST   /                       -> create_plan
/// GET    /{id}                   -> get_plan
/// PUT    /{id}                   -> update_plan
/// DELETE /{id}                   -> delete_plan
///
/// POST   /{id}/share             -> share_plan
/// DELETE /{id}/share             -> unshare_plan_by_email (?email=)
/// DELETE /{id}/share/{user_id}   -> unshare_plan
///
/// GET    /{id}/reviews           -> list_reviews
/// POST   /{id}/reviews           -> upsert_review
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(study_plan::list_plans).post(study_plan::create_plan))
        .route(
            "/{id}",
            get(study_plan::get_plan)
                .put(study_plan::update_plan)
                .delete(study_plan::delete_plan),
        )
        // Sharing endpoints
        .route(
            "/{id}/share",
            post(study_plan::share_plan).delete(study_plan::unshare_plan_by_email),
        )
        .route("/{id}/share/{user_id}", delete(study_plan::unshare_plan))
        // Plan-scoped reviews
        .route(
            "/{id}/reviews",
            get(review::list_reviews).post(review::upsert_review),
        )
}
