//! Resource entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studyloom_core::progress::ResourceView;
use studyloom_core::resources::ResourceMetadata;
use studyloom_core::types::{DbId, Timestamp};

/// A row from the `resources` table.
///
/// Resources are shared: the same URL referenced by two plans resolves to
/// one row (unique on `url`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Resource {
    pub id: DbId,
    pub resource_type: String,
    pub title: String,
    pub url: String,
    pub metadata: serde_json::Value,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Resource {
    /// Parse the jsonb metadata payload into its typed form.
    ///
    /// Unknown or malformed payloads degrade to an empty metadata set (all
    /// time contributions become 0) rather than failing a read.
    pub fn typed_metadata(&self) -> ResourceMetadata {
        serde_json::from_value(self.metadata.clone()).unwrap_or_default()
    }

    /// The slice of this row the progress aggregator needs.
    pub fn to_view(&self) -> ResourceView {
        ResourceView {
            id: self.id,
            resource_type: self.resource_type.clone(),
            metadata: self.typed_metadata(),
        }
    }
}

/// DTO for `PUT /resources/{id}`. Only estimate-bearing fields and the
/// title may change; type and URL are fixed at creation.
#[derive(Debug, Deserialize)]
pub struct UpdateResource {
    pub title: Option<String>,
    pub pages: Option<i64>,
    pub mins_per_page: Option<i64>,
    pub estimated_mins: Option<i64>,
}
