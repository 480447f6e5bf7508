//! Handlers for plan reviews and their admin moderation surface.
//!
//! One review per user per plan (submitting again overwrites and resets
//! approval). Unapproved reviews are visible to admins only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use studyloom_core::error::CoreError;
use studyloom_core::roles::ROLE_ADMIN;
use studyloom_core::types::DbId;
use studyloom_db::models::review::{CreateReview, Review};
use studyloom_db::repositories::ReviewRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::study_plan::{ensure_can_view, load_plan};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

/// GET /api/v1/study-plans/{id}/reviews
///
/// Approved reviews for callers with view access; admins also see the
/// moderation queue.
pub async fn list_reviews(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Review>>>> {
    let (plan, shares) = load_plan(&state, plan_id).await?;
    ensure_can_view(&plan, &shares, &auth)?;

    let include_unapproved = auth.role == ROLE_ADMIN;
    let reviews = ReviewRepo::list_for_plan(&state.pool, plan_id, include_unapproved).await?;

    Ok(Json(DataResponse { data: reviews }))
}

/// POST /api/v1/study-plans/{id}/reviews
///
/// Upsert the caller's review of a plan they can view.
pub async fn upsert_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
    Json(input): Json<CreateReview>,
) -> AppResult<impl IntoResponse> {
    let (plan, shares) = load_plan(&state, plan_id).await?;
    ensure_can_view(&plan, &shares, &auth)?;

    if !(1..=5).contains(&input.rating) {
        return Err(AppError::Core(CoreError::Validation(
            "rating must be between 1 and 5".into(),
        )));
    }

    let review = ReviewRepo::upsert(
        &state.pool,
        plan_id,
        auth.user_id,
        input.rating,
        input.comment.as_deref(),
    )
    .await?;

    tracing::info!(user_id = auth.user_id, plan_id, rating = input.rating, "Review submitted");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Review submitted; it will appear once approved".to_string(),
            data: review,
        }),
    ))
}

// ---------------------------------------------------------------------------
// Admin moderation
// ---------------------------------------------------------------------------

/// PUT /api/v1/admin/reviews/{id}/approve
pub async fn approve_review(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(review_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let approved = ReviewRepo::approve(&state.pool, review_id).await?;
    if !approved {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Review",
            id: review_id,
        }));
    }

    tracing::info!(admin_id = admin.user_id, review_id, "Review approved");

    Ok(Json(serde_json::json!({
        "message": "Review approved"
    })))
}

/// DELETE /api/v1/admin/reviews/{id}
pub async fn delete_review(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(review_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let deleted = ReviewRepo::delete(&state.pool, review_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Review",
            id: review_id,
        }));
    }

    tracing::info!(admin_id = admin.user_id, review_id, "Review deleted");

    Ok(Json(serde_json::json!({
        "message": "Review deleted"
    })))
}
