//! Handlers for the `/instances` resource.
//!
//! An instance is one user's personal, time-boxed run of a plan. Its
//! resource list is snapshotted at creation and never follows later plan
//! edits. All progress figures returned here are recomputed from the
//! global ledger on every read; the instance's own `completed_resources`
//! array is only a display hint, reconciled (and opportunistically
//! re-cached) against the ledger.

use std::collections::HashMap;
use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use studyloom_core::error::CoreError;
use studyloom_core::instances::{validate_date_range, validate_status};
use studyloom_core::progress::{reconcile_completed, summarize, ProgressSummary};
use studyloom_core::reminders::{default_rules, validate_rules, ReminderRule};
use studyloom_core::types::DbId;
use studyloom_db::models::instance::{CreateInstance, PlanInstance, UpdateInstance};
use studyloom_db::models::resource::Resource;
use studyloom_db::repositories::{
    InstanceRepo, ResourceRepo, StudyPlanRepo, UserProgressRepo, UserRepo,
};

use crate::error::{AppError, AppResult};
use crate::handlers::study_plan::{ensure_can_view, load_plan};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// An instance with its snapshot resources resolved and the owner's
/// ledger-derived progress.
#[derive(Debug, serde::Serialize)]
pub struct InstanceDetail {
    #[serde(flatten)]
    pub instance: PlanInstance,
    /// Snapshot resources in snapshot order. Deleted resources are
    /// absent.
    pub resources: Vec<Resource>,
    pub progress: ProgressSummary,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load an instance owned by the caller, or fail.
pub(crate) async fn load_owned_instance(
    state: &AppState,
    auth: &AuthUser,
    instance_id: DbId,
) -> AppResult<PlanInstance> {
    let instance = InstanceRepo::find_by_id(&state.pool, instance_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Instance",
            id: instance_id,
        }))?;
    if instance.user_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the instance owner may access it".into(),
        )));
    }
    Ok(instance)
}

/// Resolve an instance's snapshot against the resource table and the
/// global completion ledger, reconciling the cached hint array.
async fn instance_detail(
    state: &AppState,
    auth: &AuthUser,
    mut instance: PlanInstance,
) -> AppResult<InstanceDetail> {
    let snapshot = instance.snapshot_resource_ids.clone();

    let fetched = ResourceRepo::list_by_ids(&state.pool, &snapshot).await?;
    let mut by_id: HashMap<DbId, Resource> = fetched.into_iter().map(|r| (r.id, r)).collect();
    let resources: Vec<Resource> = snapshot.iter().filter_map(|id| by_id.remove(id)).collect();

    let completed: HashSet<DbId> =
        UserProgressRepo::completed_ids(&state.pool, auth.user_id, &snapshot)
            .await?
            .into_iter()
            .collect();

    let views: Vec<_> = resources.iter().map(|r| r.to_view()).collect();
    let progress = summarize(&views, &completed);

    // The ledger wins over the cached hint; re-cache when they drift
    // (e.g. the resource was completed through a sibling instance).
    let reconciled = reconcile_completed(&snapshot, &completed);
    if reconciled != instance.completed_resources {
        if let Err(e) = InstanceRepo::set_completed(&state.pool, instance.id, &reconciled).await {
            tracing::warn!(instance_id = instance.id, error = %e, "Failed to re-cache completion hint");
        }
        instance.completed_resources = reconciled;
    }

    Ok(InstanceDetail {
        instance,
        resources,
        progress,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/instances
///
/// The caller's instances, newest first.
pub async fn list_instances(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<PlanInstance>>>> {
    let instances = InstanceRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: instances }))
}

/// POST /api/v1/instances
///
/// Create an instance of a plan the caller can view, snapshotting the
/// plan's current resource list.
pub async fn create_instance(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateInstance>,
) -> AppResult<impl IntoResponse> {
    let (plan, shares) = load_plan(&state, input.plan_id).await?;
    ensure_can_view(&plan, &shares, &auth)?;

    validate_date_range(input.start_date, input.end_date)?;

    // The central invariant: freeze the plan's resource list now. Later
    // plan edits must not reach this instance.
    let snapshot = StudyPlanRepo::resource_ids(&state.pool, plan.id).await?;

    // Reminder precedence: explicit request rules, else the caller's
    // settings, else the built-in defaults.
    let rules: Vec<ReminderRule> = match &input.reminders {
        Some(rules) => {
            validate_rules(rules)?;
            rules.clone()
        }
        None => {
            let settings = UserRepo::settings_for(&state.pool, auth.user_id).await?;
            let from_settings: Vec<ReminderRule> =
                serde_json::from_value(settings.custom_reminders).unwrap_or_default();
            if from_settings.is_empty() {
                default_rules()
            } else {
                from_settings
            }
        }
    };
    let reminders = serde_json::to_value(&rules)
        .map_err(|e| AppError::InternalError(format!("reminder serialization failed: {e}")))?;

    let schedule = input
        .resource_schedule
        .clone()
        .unwrap_or_else(|| serde_json::json!({}));

    let instance = InstanceRepo::create(
        &state.pool,
        auth.user_id,
        plan.id,
        input.title.as_deref(),
        &snapshot,
        input.start_date,
        input.end_date,
        &reminders,
        input.reminder_time.as_deref(),
        &schedule,
    )
    .await?;

    // Advisory counter, uncoordinated with the insert.
    if let Err(e) = StudyPlanRepo::bump_instance_count(&state.pool, plan.id, 1).await {
        tracing::warn!(plan_id = plan.id, error = %e, "Failed to bump instance count");
    }

    tracing::info!(
        user_id = auth.user_id,
        instance_id = instance.id,
        plan_id = plan.id,
        resources = instance.snapshot_resource_ids.len(),
        "Instance created"
    );

    let detail = instance_detail(&state, &auth, instance).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Instance created".to_string(),
            data: detail,
        }),
    ))
}

/// GET /api/v1/instances/{id}
///
/// Owner only. Progress is recomputed from the ledger, so completions
/// made through sibling instances show up here without any write having
/// touched this row.
pub async fn get_instance(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(instance_id): Path<DbId>,
) -> AppResult<Json<DataResponse<InstanceDetail>>> {
    let instance = load_owned_instance(&state, &auth, instance_id).await?;
    let detail = instance_detail(&state, &auth, instance).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/instances/{id}
///
/// Owner only. Only the allow-listed fields in [`UpdateInstance`] are
/// applied; anything else in the body is silently ignored.
pub async fn update_instance(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(instance_id): Path<DbId>,
    Json(input): Json<UpdateInstance>,
) -> AppResult<Json<MessageResponse<InstanceDetail>>> {
    let current = load_owned_instance(&state, &auth, instance_id).await?;

    if let Some(status) = &input.status {
        validate_status(status)?;
    }
    if let Some(rules) = &input.reminders {
        validate_rules(rules)?;
    }

    // Re-validate the date range with the overrides applied.
    let start = input.start_date.unwrap_or(current.start_date);
    let end = input.end_date.unwrap_or(current.end_date);
    validate_date_range(start, end)?;

    let updated = InstanceRepo::update(&state.pool, instance_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Instance",
            id: instance_id,
        }))?;

    tracing::info!(user_id = auth.user_id, instance_id, "Instance updated");

    let detail = instance_detail(&state, &auth, updated).await?;
    Ok(Json(MessageResponse {
        message: "Instance updated".to_string(),
        data: detail,
    }))
}

/// DELETE /api/v1/instances/{id}
///
/// Owner only. Decrements the plan's advisory instance counter; display
/// clamps shield readers from the race where two deletes overlap.
pub async fn delete_instance(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(instance_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    load_owned_instance(&state, &auth, instance_id).await?;

    if let Some(plan_id) = InstanceRepo::delete(&state.pool, instance_id).await? {
        if let Err(e) = StudyPlanRepo::bump_instance_count(&state.pool, plan_id, -1).await {
            tracing::warn!(plan_id, error = %e, "Failed to decrement instance count");
        }
    }

    tracing::info!(user_id = auth.user_id, instance_id, "Instance deleted");

    Ok(Json(serde_json::json!({
        "message": "Instance deleted"
    })))
}
