//! Handlers for the `/user-progress` resource -- the global completion
//! ledger.
//!
//! Completion is per `(user, resource)`, shared across every instance that
//! references the resource. A toggle updates the ledger and pushes/pulls
//! the id on the *originating* instance's denormalized hint array only;
//! sibling instances pick the change up from the ledger on their next
//! read.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use studyloom_core::error::CoreError;
use studyloom_core::types::DbId;
use studyloom_db::models::user_progress::{
    BulkToggle, BulkToggleResult, ToggleProgress, UserProgress,
};
use studyloom_db::repositories::{InstanceRepo, ResourceRepo, UserProgressRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::instance::load_owned_instance;
use crate::handlers::resource::parse_csv_ids;
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /user-progress/check`.
#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    /// Comma-separated resource ids.
    pub resource_ids: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/user-progress
///
/// The caller's full ledger, most recently touched first.
pub async fn list_progress(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<UserProgress>>>> {
    let entries = UserProgressRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// POST /api/v1/user-progress
///
/// Toggle completion for one resource. Upserts the global ledger entry
/// and keeps the originating instance's hint array in step.
pub async fn toggle_progress(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ToggleProgress>,
) -> AppResult<Json<MessageResponse<UserProgress>>> {
    let entry = apply_toggle(&state, &auth, &input).await?;

    let message = if input.completed {
        "Resource marked complete"
    } else {
        "Resource marked incomplete"
    };
    Ok(Json(MessageResponse {
        message: message.to_string(),
        data: entry,
    }))
}

/// POST /api/v1/user-progress/bulk
///
/// Apply the same toggle to many resources independently. Fail-soft: each
/// id reports its own outcome and one failure never aborts the batch.
pub async fn bulk_toggle_progress(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<BulkToggle>,
) -> AppResult<Json<DataResponse<Vec<BulkToggleResult>>>> {
    if input.resource_ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "resource_ids must not be empty".into(),
        )));
    }

    // Ownership of the originating instance is checked once up front; a
    // bad instance id should fail the request, not every item.
    if let Some(instance_id) = input.instance_id {
        load_owned_instance(&state, &auth, instance_id).await?;
    }

    let mut results = Vec::with_capacity(input.resource_ids.len());
    for &resource_id in &input.resource_ids {
        let toggle = ToggleProgress {
            resource_id,
            instance_id: input.instance_id,
            completed: input.completed,
        };
        match apply_toggle(&state, &auth, &toggle).await {
            Ok(_) => results.push(BulkToggleResult {
                resource_id,
                ok: true,
                error: None,
            }),
            Err(e) => {
                tracing::warn!(
                    user_id = auth.user_id,
                    resource_id,
                    error = %e,
                    "Bulk progress item failed"
                );
                results.push(BulkToggleResult {
                    resource_id,
                    ok: false,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    Ok(Json(DataResponse { data: results }))
}

/// GET /api/v1/user-progress/check?resource_ids=1,2,3
///
/// `{resource_id: completed}` map for the caller, straight from the
/// ledger.
pub async fn check_progress(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CheckQuery>,
) -> AppResult<Json<DataResponse<HashMap<String, bool>>>> {
    let ids = parse_csv_ids(&params.resource_ids)?;

    let completed = UserProgressRepo::completed_ids(&state.pool, auth.user_id, &ids).await?;
    let map: HashMap<String, bool> = ids
        .iter()
        .map(|id| (id.to_string(), completed.contains(id)))
        .collect();

    Ok(Json(DataResponse { data: map }))
}

// ---------------------------------------------------------------------------
// Shared toggle path
// ---------------------------------------------------------------------------

/// Upsert the ledger and synchronize the originating instance's hint.
async fn apply_toggle(
    state: &AppState,
    auth: &AuthUser,
    input: &ToggleProgress,
) -> AppResult<UserProgress> {
    let resource = ResourceRepo::find_by_id(&state.pool, input.resource_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Resource",
            id: input.resource_id,
        }))?;

    if let Some(instance_id) = input.instance_id {
        // Must own the instance the toggle is attributed to.
        load_owned_instance(state, auth, instance_id).await?;
    }

    let entry = UserProgressRepo::upsert(
        &state.pool,
        auth.user_id,
        resource.id,
        input.instance_id,
        input.completed,
    )
    .await?;

    // Hint maintenance on the originating instance only. Other instances
    // sharing this resource reconcile from the ledger on their next read.
    if let Some(instance_id) = input.instance_id {
        let result = if input.completed {
            InstanceRepo::add_completed(&state.pool, instance_id, resource.id).await
        } else {
            InstanceRepo::remove_completed(&state.pool, instance_id, resource.id).await
        };
        if let Err(e) = result {
            tracing::warn!(
                instance_id,
                resource_id = resource.id,
                error = %e,
                "Failed to update completion hint"
            );
        }
    }

    tracing::info!(
        user_id = auth.user_id,
        resource_id = resource.id,
        completed = input.completed,
        "Progress toggled"
    );

    Ok(entry)
}
