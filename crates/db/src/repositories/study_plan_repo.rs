//! Repository for the `study_plans` and `study_plan_resources` tables.

use sqlx::PgPool;
use studyloom_core::types::DbId;

use crate::models::resource::Resource;
use crate::models::study_plan::{CreateStudyPlan, StudyPlan, UpdateStudyPlan};

/// Column list for `study_plans` queries.
///
/// The counters are advisory and may drift below zero under concurrent
/// deletes; reads clamp them so the drift never reaches a response.
const COLUMNS: &str = "id, title, course_code, description, creator_id, is_public, \
     GREATEST(instance_count, 0) AS instance_count, \
     GREATEST(view_count, 0) AS view_count, \
     created_at, updated_at, updated_by";

/// Column list for joined `resources` reads.
const RESOURCE_COLUMNS: &str =
    "r.id, r.resource_type, r.title, r.url, r.metadata, r.created_by, r.created_at, r.updated_at";

/// Provides CRUD for study plans and their ordered resource references.
pub struct StudyPlanRepo;

impl StudyPlanRepo {
    pub async fn create(
        pool: &PgPool,
        creator_id: DbId,
        input: &CreateStudyPlan,
    ) -> Result<StudyPlan, sqlx::Error> {
        let query = format!(
            "INSERT INTO study_plans (title, course_code, description, creator_id, is_public) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StudyPlan>(&query)
            .bind(&input.title)
            .bind(&input.course_code)
            .bind(&input.description)
            .bind(creator_id)
            .bind(input.is_public.unwrap_or(false))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StudyPlan>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM study_plans WHERE id = $1");
        sqlx::query_as::<_, StudyPlan>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Plans created by the user.
    pub async fn list_owned(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StudyPlan>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM study_plans \
             WHERE creator_id = $1 \
             ORDER BY updated_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, StudyPlan>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Plans shared with the user, matched by resolved id or by invite
    /// email (entries whose invitee registered after the share).
    pub async fn list_shared_with(
        pool: &PgPool,
        user_id: DbId,
        email: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StudyPlan>, sqlx::Error> {
        let query = "SELECT DISTINCT p.id, p.title, p.course_code, p.description, p.creator_id, \
                 p.is_public, \
                 GREATEST(p.instance_count, 0) AS instance_count, \
                 GREATEST(p.view_count, 0) AS view_count, \
                 p.created_at, p.updated_at, p.updated_by \
             FROM study_plans p \
             JOIN plan_shares s ON s.plan_id = p.id \
             WHERE s.user_id = $1 OR s.email = $2 \
             ORDER BY p.updated_at DESC \
             LIMIT $3 OFFSET $4";
        sqlx::query_as::<_, StudyPlan>(query)
            .bind(user_id)
            .bind(email)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Publicly listed plans, most viewed first.
    pub async fn list_public(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StudyPlan>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM study_plans \
             WHERE is_public \
             ORDER BY view_count DESC, updated_at DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, StudyPlan>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Partial update of scalar fields; absent fields unchanged.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateStudyPlan,
        updated_by: DbId,
    ) -> Result<Option<StudyPlan>, sqlx::Error> {
        let query = format!(
            "UPDATE study_plans \
             SET title = COALESCE($2, title), \
                 course_code = COALESCE($3, course_code), \
                 description = COALESCE($4, description), \
                 is_public = COALESCE($5, is_public), \
                 updated_at = NOW(), \
                 updated_by = $6 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StudyPlan>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.course_code)
            .bind(&input.description)
            .bind(input.is_public)
            .bind(updated_by)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM study_plans WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the plan's ordered resource list.
    ///
    /// Existing instances are unaffected: they hold their own frozen
    /// snapshot of the previous list.
    pub async fn replace_resources(
        pool: &PgPool,
        plan_id: DbId,
        resource_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM study_plan_resources WHERE plan_id = $1")
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO study_plan_resources (plan_id, resource_id, position) \
             SELECT $1, rid, ord - 1 \
             FROM UNNEST($2::bigint[]) WITH ORDINALITY AS t(rid, ord)",
        )
        .bind(plan_id)
        .bind(resource_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    /// The plan's resource ids in display order.
    pub async fn resource_ids(pool: &PgPool, plan_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT resource_id FROM study_plan_resources \
             WHERE plan_id = $1 ORDER BY position",
        )
        .bind(plan_id)
        .fetch_all(pool)
        .await
    }

    /// The plan's resources in display order.
    pub async fn resources(pool: &PgPool, plan_id: DbId) -> Result<Vec<Resource>, sqlx::Error> {
        let query = format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources r \
             JOIN study_plan_resources pr ON pr.resource_id = r.id \
             WHERE pr.plan_id = $1 \
             ORDER BY pr.position"
        );
        sqlx::query_as::<_, Resource>(&query)
            .bind(plan_id)
            .fetch_all(pool)
            .await
    }

    /// Atomic view-count bump; advisory only, uncoordinated with reads.
    pub async fn bump_view_count(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE study_plans SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Atomic instance-count adjustment (`delta` of +1 or -1). The stored
    /// value may go negative under delete races; reads clamp.
    pub async fn bump_instance_count(pool: &PgPool, id: DbId, delta: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE study_plans SET instance_count = instance_count + $2 WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(pool)
            .await?;
        Ok(())
    }
}
