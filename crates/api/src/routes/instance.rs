//! Route definitions for the `/instances` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::instance;
use crate::state::AppState;

/// Routes mounted at `/instances`.
///
/// ```text
/// GET    /        -> list_instances
/// POST   /        -> create_instance (freezes the plan snapshot)
/// GET    /{id}    -> get_instance (ledger-reconciled progress)
/// PUT    /{id}    -> update_instance (allow-listed fields only)
/// DELETE /{id}    -> delete_instance
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(instance::list_instances).post(instance::create_instance),
        )
        .route(
            "/{id}",
            get(instance::get_instance)
                .put(instance::update_instance)
                .delete(instance::delete_instance),
        )
}
