//! Handlers for the `/study-plans` resource.
//!
//! A plan is a reusable, shareable template listing ordered learning
//! resources. Every mutating endpoint consults the capability predicates
//! in `studyloom_core::sharing` against the plan's collaborator list.

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use studyloom_core::error::CoreError;
use studyloom_core::progress::{summarize, ProgressSummary};
use studyloom_core::sharing::{
    can_edit, can_remove_share, can_share, can_view, normalize_email, validate_share_request,
    PlanAccess,
};
use studyloom_core::types::DbId;
use studyloom_db::models::study_plan::{
    CreateStudyPlan, PlanShare, ShareRequest, StudyPlan, UpdateStudyPlan,
};
use studyloom_db::models::resource::Resource;
use studyloom_db::repositories::{
    PlanShareRepo, ResourceRepo, StudyPlanRepo, UserProgressRepo, UserRepo,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /study-plans`.
#[derive(Debug, Deserialize)]
pub struct ListPlansQuery {
    /// `mine` (default), `shared`, or `public`.
    pub scope: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Query parameters for `DELETE /study-plans/{id}/share`.
#[derive(Debug, Deserialize)]
pub struct UnshareQuery {
    /// Invite email to revoke (creator only; for entries that have no
    /// resolved user id yet).
    pub email: String,
}

/// Maximum page size for plan listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for plan listing.
const DEFAULT_LIMIT: i64 = 50;

/// A plan with its ordered resources, collaborator list, and the caller's
/// progress.
#[derive(Debug, serde::Serialize)]
pub struct PlanDetail {
    #[serde(flatten)]
    pub plan: StudyPlan,
    pub resources: Vec<Resource>,
    pub shared_with: Vec<PlanShare>,
    pub progress: ProgressSummary,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a plan and its share list, or 404.
pub(crate) async fn load_plan(
    state: &AppState,
    plan_id: DbId,
) -> AppResult<(StudyPlan, Vec<PlanShare>)> {
    let plan = StudyPlanRepo::find_by_id(&state.pool, plan_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "StudyPlan",
            id: plan_id,
        }))?;
    let shares = PlanShareRepo::list_for_plan(&state.pool, plan_id).await?;
    Ok((plan, shares))
}

/// 403 unless the caller can view the plan.
pub(crate) fn ensure_can_view(
    plan: &StudyPlan,
    shares: &[PlanShare],
    auth: &AuthUser,
) -> AppResult<()> {
    let access = PlanAccess {
        creator_id: plan.creator_id,
        is_public: plan.is_public,
    };
    let entries: Vec<_> = shares.iter().map(|s| s.to_entry()).collect();
    if !can_view(&access, &entries, &auth.principal()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not have access to this plan".into(),
        )));
    }
    Ok(())
}

/// 403 unless the caller can edit the plan.
fn ensure_can_edit(plan: &StudyPlan, shares: &[PlanShare], auth: &AuthUser) -> AppResult<()> {
    let access = PlanAccess {
        creator_id: plan.creator_id,
        is_public: plan.is_public,
    };
    let entries: Vec<_> = shares.iter().map(|s| s.to_entry()).collect();
    if !can_edit(&access, &entries, &auth.principal()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Edit access to this plan required".into(),
        )));
    }
    Ok(())
}

/// Verify every referenced resource id exists.
async fn ensure_resources_exist(state: &AppState, ids: &[DbId]) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = ResourceRepo::list_by_ids(&state.pool, ids).await?;
    if found.len() != ids.iter().collect::<HashSet<_>>().len() {
        return Err(AppError::Core(CoreError::Validation(
            "One or more resource ids do not exist".into(),
        )));
    }
    Ok(())
}

/// Assemble the full plan detail payload for the caller.
async fn plan_detail(
    state: &AppState,
    auth: &AuthUser,
    plan: StudyPlan,
    shares: Vec<PlanShare>,
) -> AppResult<PlanDetail> {
    let resources = StudyPlanRepo::resources(&state.pool, plan.id).await?;
    let ids: Vec<DbId> = resources.iter().map(|r| r.id).collect();
    let completed: HashSet<DbId> = UserProgressRepo::completed_ids(&state.pool, auth.user_id, &ids)
        .await?
        .into_iter()
        .collect();
    let views: Vec<_> = resources.iter().map(|r| r.to_view()).collect();
    let progress = summarize(&views, &completed);

    Ok(PlanDetail {
        plan,
        resources,
        shared_with: shares,
        progress,
    })
}

// ---------------------------------------------------------------------------
// Plan CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/study-plans
///
/// List plans by scope: the caller's own (default), those shared with
/// them, or the public catalogue.
pub async fn list_plans(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListPlansQuery>,
) -> AppResult<Json<DataResponse<Vec<StudyPlan>>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let plans = match params.scope.as_deref().unwrap_or("mine") {
        "mine" => StudyPlanRepo::list_owned(&state.pool, auth.user_id, limit, offset).await?,
        "shared" => {
            StudyPlanRepo::list_shared_with(&state.pool, auth.user_id, &auth.email, limit, offset)
                .await?
        }
        "public" => StudyPlanRepo::list_public(&state.pool, limit, offset).await?,
        other => {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid scope '{other}'. Must be one of: mine, shared, public"
            ))))
        }
    };

    Ok(Json(DataResponse { data: plans }))
}

/// POST /api/v1/study-plans
pub async fn create_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateStudyPlan>,
) -> AppResult<impl IntoResponse> {
    if input.title.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "title must not be empty".into(),
        )));
    }

    let resource_ids = input.resource_ids.clone().unwrap_or_default();
    ensure_resources_exist(&state, &resource_ids).await?;

    let plan = StudyPlanRepo::create(&state.pool, auth.user_id, &input).await?;
    if !resource_ids.is_empty() {
        StudyPlanRepo::replace_resources(&state.pool, plan.id, &resource_ids).await?;
    }

    tracing::info!(user_id = auth.user_id, plan_id = plan.id, "Study plan created");

    let detail = plan_detail(&state, &auth, plan, Vec::new()).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Study plan created".to_string(),
            data: detail,
        }),
    ))
}

/// GET /api/v1/study-plans/{id}
///
/// Full plan detail with ordered resources and the caller's progress.
/// Also bumps the advisory view counter.
pub async fn get_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
) -> AppResult<Json<DataResponse<PlanDetail>>> {
    let (plan, shares) = load_plan(&state, plan_id).await?;
    ensure_can_view(&plan, &shares, &auth)?;

    // Advisory counter; a failed bump must not fail the read.
    if let Err(e) = StudyPlanRepo::bump_view_count(&state.pool, plan_id).await {
        tracing::warn!(plan_id, error = %e, "Failed to bump view count");
    }

    let detail = plan_detail(&state, &auth, plan, shares).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// PUT /api/v1/study-plans/{id}
///
/// Partial update; requires edit capability. Replacing the resource list
/// never touches existing instances' snapshots.
pub async fn update_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
    Json(input): Json<UpdateStudyPlan>,
) -> AppResult<Json<MessageResponse<PlanDetail>>> {
    let (plan, shares) = load_plan(&state, plan_id).await?;
    ensure_can_edit(&plan, &shares, &auth)?;

    if let Some(title) = &input.title {
        if title.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation(
                "title must not be empty".into(),
            )));
        }
    }

    if let Some(ids) = &input.resource_ids {
        ensure_resources_exist(&state, ids).await?;
        StudyPlanRepo::replace_resources(&state.pool, plan_id, ids).await?;
    }

    let updated = StudyPlanRepo::update(&state.pool, plan_id, &input, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "StudyPlan",
            id: plan_id,
        }))?;

    tracing::info!(user_id = auth.user_id, plan_id, "Study plan updated");

    let detail = plan_detail(&state, &auth, updated, shares).await?;
    Ok(Json(MessageResponse {
        message: "Study plan updated".to_string(),
        data: detail,
    }))
}

/// DELETE /api/v1/study-plans/{id}
///
/// Creator only.
pub async fn delete_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let (plan, _) = load_plan(&state, plan_id).await?;
    if plan.creator_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the plan creator may delete it".into(),
        )));
    }

    StudyPlanRepo::delete(&state.pool, plan_id).await?;
    tracing::info!(user_id = auth.user_id, plan_id, "Study plan deleted");

    Ok(Json(serde_json::json!({
        "message": "Study plan deleted"
    })))
}

// ---------------------------------------------------------------------------
// Sharing
// ---------------------------------------------------------------------------

/// POST /api/v1/study-plans/{id}/share
///
/// Creator or an editor-role collaborator may share (viewers may not).
/// The invitation email is best-effort: a delivery failure is logged and
/// never fails the share.
pub async fn share_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
    Json(input): Json<ShareRequest>,
) -> AppResult<impl IntoResponse> {
    let (plan, shares) = load_plan(&state, plan_id).await?;

    let access = PlanAccess {
        creator_id: plan.creator_id,
        is_public: plan.is_public,
    };
    let entries: Vec<_> = shares.iter().map(|s| s.to_entry()).collect();
    if !can_share(&access, &entries, &auth.principal()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the creator or an editor may share this plan".into(),
        )));
    }

    let creator_email = match UserRepo::find_by_id(&state.pool, plan.creator_id).await? {
        Some(creator) => creator.email,
        None => String::new(),
    };

    let email = validate_share_request(&creator_email, &entries, &input.email, &input.role)?;

    // Embed the user id immediately when the invitee already has an
    // account; otherwise the entry stays email-only until they register.
    let invitee = UserRepo::find_by_email(&state.pool, &email).await?;
    let share = PlanShareRepo::create(
        &state.pool,
        plan_id,
        &email,
        &input.role,
        invitee.as_ref().map(|u| u.id),
    )
    .await?;

    if let Some(mailer) = &state.mailer {
        let subject = format!("[Studyloom] {} shared a study plan with you", auth.display_name);
        let body = format!(
            "{} invited you to \"{}\" as {}.\n\nSign in with this email address to open it.",
            if auth.display_name.is_empty() {
                &auth.email
            } else {
                &auth.display_name
            },
            plan.title,
            input.role,
        );
        if let Err(e) = mailer.send(&email, &subject, &body).await {
            tracing::warn!(plan_id, to = %email, error = %e, "Share invitation email failed");
        }
    }

    tracing::info!(user_id = auth.user_id, plan_id, to = %email, role = %input.role, "Plan shared");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Plan shared with {email}"),
            data: share,
        }),
    ))
}

/// DELETE /api/v1/study-plans/{id}/share/{user_id}
///
/// Creator removes anyone; a collaborator removes only themselves.
pub async fn unshare_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((plan_id, target_user_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<serde_json::Value>> {
    let (plan, _) = load_plan(&state, plan_id).await?;

    let access = PlanAccess {
        creator_id: plan.creator_id,
        is_public: plan.is_public,
    };
    if !can_remove_share(&access, &auth.principal(), target_user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the creator may remove other collaborators".into(),
        )));
    }

    let removed = PlanShareRepo::delete_by_user(&state.pool, plan_id, target_user_id).await?;
    if !removed {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "PlanShare",
            id: target_user_id,
        }));
    }

    tracing::info!(user_id = auth.user_id, plan_id, target_user_id, "Collaborator removed");

    Ok(Json(serde_json::json!({
        "message": "Collaborator removed"
    })))
}

/// DELETE /api/v1/study-plans/{id}/share?email=...
///
/// Creator-only revocation of an invite whose email has no account yet
/// (such entries have no user id to address on the path form).
pub async fn unshare_plan_by_email(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
    Query(params): Query<UnshareQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let (plan, _) = load_plan(&state, plan_id).await?;
    if plan.creator_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the plan creator may revoke invites".into(),
        )));
    }

    let email = normalize_email(&params.email);
    let removed = PlanShareRepo::delete_by_email(&state.pool, plan_id, &email).await?;
    if !removed {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "PlanShare",
            id: plan_id,
        }));
    }

    tracing::info!(user_id = auth.user_id, plan_id, to = %email, "Invite revoked");

    Ok(Json(serde_json::json!({
        "message": "Invite revoked"
    })))
}
