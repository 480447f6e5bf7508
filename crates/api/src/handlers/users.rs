//! Handlers for the `/users` resource.

use axum::extract::State;
use axum::Json;

use studyloom_core::error::CoreError;
use studyloom_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users/me
///
/// The caller's account row plus notification settings. The row is
/// guaranteed to exist: the auth extractor creates it lazily.
pub async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<serde_json::Value>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    let settings = UserRepo::settings_for(&state.pool, auth.user_id).await?;

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "user": user,
            "settings": settings,
        }),
    }))
}
