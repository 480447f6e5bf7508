//! Repository for the `resources` table.

use sqlx::PgPool;
use studyloom_core::types::DbId;

use crate::models::resource::Resource;

/// Column list for `resources` queries.
const COLUMNS: &str = "id, resource_type, title, url, metadata, created_by, created_at, updated_at";

/// Provides CRUD and URL-deduplicated inserts for resources.
pub struct ResourceRepo;

impl ResourceRepo {
    /// Insert a resource, or return the existing row for its URL.
    ///
    /// Returns `(resource, is_new)`. The unique constraint on `url` makes
    /// this safe under concurrent identical inserts: the loser of the race
    /// falls through to the lookup.
    pub async fn insert_or_get(
        pool: &PgPool,
        resource_type: &str,
        title: &str,
        url: &str,
        metadata: &serde_json::Value,
        created_by: Option<DbId>,
    ) -> Result<(Resource, bool), sqlx::Error> {
        let query = format!(
            "INSERT INTO resources (resource_type, title, url, metadata, created_by) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (url) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Resource>(&query)
            .bind(resource_type)
            .bind(title)
            .bind(url)
            .bind(metadata)
            .bind(created_by)
            .fetch_optional(pool)
            .await?;

        match inserted {
            Some(resource) => Ok((resource, true)),
            None => {
                let existing = Self::find_by_url(pool, url)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                Ok((existing, false))
            }
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM resources WHERE id = $1");
        sqlx::query_as::<_, Resource>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_url(pool: &PgPool, url: &str) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM resources WHERE url = $1");
        sqlx::query_as::<_, Resource>(&query)
            .bind(url)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a set of resources by id. Order is unspecified; callers that
    /// promise an order must sort the result themselves.
    pub async fn list_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Resource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM resources WHERE id = ANY($1)");
        sqlx::query_as::<_, Resource>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Fetch a set of resources by URL (playlist dedup path).
    pub async fn list_by_urls(pool: &PgPool, urls: &[String]) -> Result<Vec<Resource>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM resources WHERE url = ANY($1)");
        sqlx::query_as::<_, Resource>(&query)
            .bind(urls)
            .fetch_all(pool)
            .await
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Resource>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM resources ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Resource>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Replace title and metadata. Type and URL are immutable.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        title: Option<&str>,
        metadata: &serde_json::Value,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let query = format!(
            "UPDATE resources \
             SET title = COALESCE($2, title), metadata = $3, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Resource>(&query)
            .bind(id)
            .bind(title)
            .bind(metadata)
            .fetch_optional(pool)
            .await
    }

    /// Delete a resource. Plan references cascade away with it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Ids of plans that reference this resource.
    pub async fn plan_ids_referencing(
        pool: &PgPool,
        resource_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT plan_id FROM study_plan_resources WHERE resource_id = $1")
            .bind(resource_id)
            .fetch_all(pool)
            .await
    }
}
