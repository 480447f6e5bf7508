//! Handlers for the `/resources` resource -- the normalizer.
//!
//! A resource is keyed by URL: posting a URL that already exists returns
//! the existing row with `is_new = false` instead of creating a duplicate.
//! YouTube inputs resolve their metadata through the Data API; playlists
//! expand into one `youtube-video` resource per entry, all-or-nothing.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use studyloom_core::error::CoreError;
use studyloom_core::resources::{
    normalize_static, resource_types, NewResource, ResourceMetadata,
};
use studyloom_core::roles::ROLE_ADMIN;
use studyloom_core::sharing::{can_edit, PlanAccess};
use studyloom_core::types::DbId;
use studyloom_db::models::resource::{Resource, UpdateResource};
use studyloom_db::repositories::{PlanShareRepo, ResourceRepo, StudyPlanRepo};
use studyloom_youtube::{extract_playlist_id, extract_video_id, watch_url, YouTubeClient};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /resources`.
#[derive(Debug, Deserialize)]
pub struct ListResourcesQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for `GET /resources/bulk`.
#[derive(Debug, Deserialize)]
pub struct BulkQuery {
    /// Comma-separated resource ids.
    pub ids: String,
}

/// Maximum page size for resource listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for resource listing.
const DEFAULT_LIMIT: i64 = 50;

/// A normalized resource plus whether this call created it.
#[derive(Debug, serde::Serialize)]
pub struct NormalizedResource {
    #[serde(flatten)]
    pub resource: Resource,
    pub is_new: bool,
}

/// Result of a playlist expansion.
#[derive(Debug, serde::Serialize)]
pub struct PlaylistExpansion {
    /// One entry per playlist video, in playlist order.
    pub resources: Vec<NormalizedResource>,
    pub created: usize,
    pub existing: usize,
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// POST /api/v1/resources
///
/// Normalize `{type, url, ...}` into a canonical resource, deduplicated by
/// URL. Playlist inputs return a [`PlaylistExpansion`] instead of a single
/// resource.
pub async fn create_resource(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewResource>,
) -> AppResult<impl IntoResponse> {
    // Validates the type/url and produces (title, metadata) for the
    // non-YouTube types.
    let (static_title, static_metadata) = normalize_static(&input)?;

    match input.resource_type.as_str() {
        resource_types::YOUTUBE_VIDEO => {
            let youtube = require_youtube(&state)?;
            let video_id = extract_video_id(&input.url)?;
            let video = youtube.fetch_video(&video_id).await?;

            let metadata = ResourceMetadata {
                duration_mins: Some(video.duration_mins),
                thumbnail_url: video.thumbnail_url.clone(),
                ..Default::default()
            };
            let (resource, is_new) = insert_resource(
                &state,
                resource_types::YOUTUBE_VIDEO,
                &video.title,
                &video.watch_url(),
                &metadata,
                auth.user_id,
            )
            .await?;

            created_response(resource, is_new)
        }

        resource_types::YOUTUBE_PLAYLIST => {
            let youtube = require_youtube(&state)?;
            let playlist_id = extract_playlist_id(&input.url)?;
            let expansion = expand_playlist(&state, &auth, youtube, &playlist_id).await?;

            let message = format!(
                "Playlist imported: {} new, {} already present",
                expansion.created, expansion.existing
            );
            tracing::info!(
                user_id = auth.user_id,
                playlist_id = %playlist_id,
                created = expansion.created,
                existing = expansion.existing,
                "Playlist expanded"
            );
            Ok((
                StatusCode::CREATED,
                Json(MessageResponse {
                    message,
                    data: serde_json::to_value(expansion)
                        .map_err(|e| AppError::InternalError(e.to_string()))?,
                }),
            ))
        }

        _ => {
            let (resource, is_new) = insert_resource(
                &state,
                &input.resource_type,
                &static_title,
                input.url.trim(),
                &static_metadata,
                auth.user_id,
            )
            .await?;
            created_response(resource, is_new)
        }
    }
}

/// Expand a playlist into per-video resources, deduplicating each video
/// independently by its canonical watch URL.
///
/// Any provider failure -- including a video the provider no longer knows --
/// fails the whole operation; there is no partial import. The response
/// list preserves the playlist's order across new and existing entries.
async fn expand_playlist(
    state: &AppState,
    auth: &AuthUser,
    youtube: &YouTubeClient,
    playlist_id: &str,
) -> AppResult<PlaylistExpansion> {
    let video_ids = youtube.fetch_playlist_video_ids(playlist_id).await?;
    let videos = youtube.fetch_videos(&video_ids).await?;

    if videos.len() != video_ids.len() {
        return Err(AppError::Core(CoreError::External(format!(
            "Playlist {playlist_id} references {} videos but only {} could be fetched",
            video_ids.len(),
            videos.len()
        ))));
    }

    // Index fetched metadata by id so the insert pass can follow playlist
    // order exactly.
    let by_id: HashMap<&str, _> = videos.iter().map(|v| (v.video_id.as_str(), v)).collect();

    let mut resources = Vec::with_capacity(video_ids.len());
    let mut created = 0;
    let mut existing = 0;

    for video_id in &video_ids {
        // Guaranteed present by the count check above.
        let Some(video) = by_id.get(video_id.as_str()) else {
            continue;
        };
        let metadata = ResourceMetadata {
            duration_mins: Some(video.duration_mins),
            thumbnail_url: video.thumbnail_url.clone(),
            ..Default::default()
        };
        let (resource, is_new) = insert_resource(
            state,
            resource_types::YOUTUBE_VIDEO,
            &video.title,
            &watch_url(video_id),
            &metadata,
            auth.user_id,
        )
        .await?;

        if is_new {
            created += 1;
        } else {
            existing += 1;
        }
        resources.push(NormalizedResource { resource, is_new });
    }

    Ok(PlaylistExpansion {
        resources,
        created,
        existing,
    })
}

/// Insert or reuse a resource row for the given URL.
async fn insert_resource(
    state: &AppState,
    resource_type: &str,
    title: &str,
    url: &str,
    metadata: &ResourceMetadata,
    created_by: DbId,
) -> AppResult<(Resource, bool)> {
    let metadata = serde_json::to_value(metadata)
        .map_err(|e| AppError::InternalError(format!("metadata serialization failed: {e}")))?;
    let (resource, is_new) = ResourceRepo::insert_or_get(
        &state.pool,
        resource_type,
        title,
        url,
        &metadata,
        Some(created_by),
    )
    .await?;
    Ok((resource, is_new))
}

fn require_youtube(state: &AppState) -> AppResult<&YouTubeClient> {
    state.youtube.as_deref().ok_or(AppError::Core(CoreError::External(
        "YouTube API is not configured (set YOUTUBE_API_KEY)".into(),
    )))
}

fn created_response(
    resource: Resource,
    is_new: bool,
) -> AppResult<(StatusCode, Json<MessageResponse<serde_json::Value>>)> {
    let status = if is_new {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let message = if is_new {
        "Resource created".to_string()
    } else {
        "Resource already exists for this URL".to_string()
    };
    let data = serde_json::to_value(NormalizedResource { resource, is_new })
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    Ok((status, Json(MessageResponse { message, data })))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/resources
pub async fn list_resources(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListResourcesQuery>,
) -> AppResult<Json<DataResponse<Vec<Resource>>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let resources = ResourceRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: resources }))
}

/// GET /api/v1/resources/bulk?ids=1,2,3
///
/// Fetch a batch of resources. The response order matches the requested
/// id order -- a documented contract, not an accident of the storage
/// layer.
pub async fn bulk_get_resources(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BulkQuery>,
) -> AppResult<Json<DataResponse<Vec<Resource>>>> {
    let ids = parse_csv_ids(&params.ids)?;

    let fetched = ResourceRepo::list_by_ids(&state.pool, &ids).await?;
    let mut by_id: HashMap<DbId, Resource> =
        fetched.into_iter().map(|r| (r.id, r)).collect();
    let ordered: Vec<Resource> = ids.iter().filter_map(|id| by_id.remove(id)).collect();

    Ok(Json(DataResponse { data: ordered }))
}

/// GET /api/v1/resources/{id}
pub async fn get_resource(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Resource>>> {
    let resource = ResourceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Resource",
            id,
        }))?;
    Ok(Json(DataResponse { data: resource }))
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// PUT /api/v1/resources/{id}
///
/// Update title and time-estimate fields. Allowed for the resource's
/// creator, an admin, or anyone with edit rights on a plan referencing it.
pub async fn update_resource(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateResource>,
) -> AppResult<Json<MessageResponse<Resource>>> {
    let resource = ResourceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Resource",
            id,
        }))?;

    ensure_can_touch_resource(&state, &auth, &resource).await?;

    for value in [input.pages, input.mins_per_page, input.estimated_mins]
        .into_iter()
        .flatten()
    {
        if value <= 0 {
            return Err(AppError::Core(CoreError::Validation(
                "Time-estimate fields must be positive".into(),
            )));
        }
    }

    // Merge the estimate fields over the stored metadata.
    let mut metadata = resource.typed_metadata();
    if input.pages.is_some() {
        metadata.pages = input.pages;
    }
    if input.mins_per_page.is_some() {
        metadata.mins_per_page = input.mins_per_page;
    }
    if input.estimated_mins.is_some() {
        metadata.estimated_mins = input.estimated_mins;
    }
    let metadata = serde_json::to_value(&metadata)
        .map_err(|e| AppError::InternalError(format!("metadata serialization failed: {e}")))?;

    let updated = ResourceRepo::update(&state.pool, id, input.title.as_deref(), &metadata)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Resource",
            id,
        }))?;

    tracing::info!(user_id = auth.user_id, resource_id = id, "Resource updated");

    Ok(Json(MessageResponse {
        message: "Resource updated".to_string(),
        data: updated,
    }))
}

/// DELETE /api/v1/resources/{id}
///
/// Creator or admin only. Plan references cascade away; instance
/// snapshots keep the id, which simply stops resolving.
pub async fn delete_resource(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let resource = ResourceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Resource",
            id,
        }))?;

    if auth.role != ROLE_ADMIN && resource.created_by != Some(auth.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the resource creator or an admin may delete it".into(),
        )));
    }

    ResourceRepo::delete(&state.pool, id).await?;
    tracing::info!(user_id = auth.user_id, resource_id = id, "Resource deleted");

    Ok(Json(serde_json::json!({
        "message": "Resource deleted"
    })))
}

/// Edit permission for a shared resource: its creator, an admin, or an
/// editor of any plan that references it.
async fn ensure_can_touch_resource(
    state: &AppState,
    auth: &AuthUser,
    resource: &Resource,
) -> AppResult<()> {
    if auth.role == ROLE_ADMIN || resource.created_by == Some(auth.user_id) {
        return Ok(());
    }

    let plan_ids = ResourceRepo::plan_ids_referencing(&state.pool, resource.id).await?;
    for plan_id in plan_ids {
        let Some(plan) = StudyPlanRepo::find_by_id(&state.pool, plan_id).await? else {
            continue;
        };
        let shares = PlanShareRepo::list_for_plan(&state.pool, plan_id).await?;
        let access = PlanAccess {
            creator_id: plan.creator_id,
            is_public: plan.is_public,
        };
        let entries: Vec<_> = shares.iter().map(|s| s.to_entry()).collect();
        if can_edit(&access, &entries, &auth.principal()) {
            return Ok(());
        }
    }

    Err(AppError::Core(CoreError::Forbidden(
        "Edit rights on a plan referencing this resource required".into(),
    )))
}

/// Parse a comma-separated id list.
pub(crate) fn parse_csv_ids(raw: &str) -> AppResult<Vec<DbId>> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: DbId = part.parse().map_err(|_| {
            AppError::Core(CoreError::Validation(format!("'{part}' is not a valid id")))
        })?;
        ids.push(id);
    }
    if ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "ids must contain at least one id".into(),
        )));
    }
    Ok(ids)
}
