//! Route definitions for the `/resources` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::resource;
use crate::state::AppState;

/// Routes mounted at `/resources`.
///
/// ```text
/// GET    /        -> list_resources
/// POST   /        -> create_resource (normalizer; playlists expand)
/// GET    /bulk    -> bulk_get_resources (?ids=csv, input order preserved)
/// GET    /{id}    -> get_resource
/// PUT    /{id}    -> update_resource
/// DELETE /{id}    -> delete_resource
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(resource::list_resources).post(resource::create_resource),
        )
        .route("/bulk", get(resource::bulk_get_resources))
        .route(
            "/{id}",
            get(resource::get_resource)
                .put(resource::update_resource)
                .delete(resource::delete_resource),
        )
}
