//! End-to-end repository tests for the plan/instance/progress flow.
//!
//! Each test runs against a fresh migrated database via `#[sqlx::test]`.

use sqlx::PgPool;

use studyloom_core::types::DbId;
use studyloom_db::models::study_plan::CreateStudyPlan;
use studyloom_db::repositories::{
    InstanceRepo, PlanShareRepo, ResourceRepo, StudyPlanRepo, UserProgressRepo, UserRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn make_user(pool: &PgPool, uid: &str, email: &str) -> DbId {
    UserRepo::ensure(pool, uid, email, "Test User")
        .await
        .expect("user upsert should succeed")
        .id
}

async fn make_article(pool: &PgPool, url: &str, mins: i64) -> DbId {
    let metadata = serde_json::json!({ "estimated_mins": mins });
    let (resource, _) =
        ResourceRepo::insert_or_get(pool, "article", "An article", url, &metadata, None)
            .await
            .expect("resource insert should succeed");
    resource.id
}

async fn make_plan(pool: &PgPool, creator: DbId, resource_ids: &[DbId]) -> DbId {
    let input = CreateStudyPlan {
        title: "Networks 101".to_string(),
        course_code: Some("CS-305".to_string()),
        description: None,
        is_public: Some(false),
        resource_ids: None,
    };
    let plan = StudyPlanRepo::create(pool, creator, &input)
        .await
        .expect("plan create should succeed");
    StudyPlanRepo::replace_resources(pool, plan.id, resource_ids)
        .await
        .expect("resource list replace should succeed");
    plan.id
}

async fn make_instance(pool: &PgPool, user: DbId, plan: DbId) -> DbId {
    let snapshot = StudyPlanRepo::resource_ids(pool, plan).await.unwrap();
    let now = chrono::Utc::now();
    InstanceRepo::create(
        pool,
        user,
        plan,
        None,
        &snapshot,
        now,
        now + chrono::Duration::days(30),
        &serde_json::json!([]),
        None,
        &serde_json::json!({}),
    )
    .await
    .expect("instance create should succeed")
    .id
}

// ---------------------------------------------------------------------------
// Resource URL dedup
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn same_url_resolves_to_one_resource(pool: PgPool) {
    let metadata = serde_json::json!({ "estimated_mins": 10 });
    let (first, first_new) =
        ResourceRepo::insert_or_get(&pool, "article", "A", "https://x.io/a", &metadata, None)
            .await
            .unwrap();
    let (second, second_new) =
        ResourceRepo::insert_or_get(&pool, "article", "B", "https://x.io/a", &metadata, None)
            .await
            .unwrap();

    assert!(first_new);
    assert!(!second_new);
    assert_eq!(first.id, second.id);
    // The original record wins; the second insert is a no-op.
    assert_eq!(second.title, "A");
}

// ---------------------------------------------------------------------------
// Snapshot immunity
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn snapshot_survives_plan_edits(pool: PgPool) {
    let user = make_user(&pool, "uid-1", "a@x.io").await;
    let r1 = make_article(&pool, "https://x.io/1", 10).await;
    let r2 = make_article(&pool, "https://x.io/2", 10).await;
    let plan = make_plan(&pool, user, &[r1, r2]).await;

    let instance_id = make_instance(&pool, user, plan).await;

    // Rewrite the plan's resource list after the instance exists.
    let r3 = make_article(&pool, "https://x.io/3", 10).await;
    StudyPlanRepo::replace_resources(&pool, plan, &[r3]).await.unwrap();

    let instance = InstanceRepo::find_by_id(&pool, instance_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(instance.snapshot_resource_ids, vec![r1, r2]);

    let plan_now = StudyPlanRepo::resource_ids(&pool, plan).await.unwrap();
    assert_eq!(plan_now, vec![r3]);
}

// ---------------------------------------------------------------------------
// Global completion ledger
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn completion_is_global_across_instances(pool: PgPool) {
    let user = make_user(&pool, "uid-1", "a@x.io").await;
    let resource = make_article(&pool, "https://x.io/r", 15).await;
    let plan = make_plan(&pool, user, &[resource]).await;

    let instance_a = make_instance(&pool, user, plan).await;
    let instance_b = make_instance(&pool, user, plan).await;

    // Toggle through instance A only.
    UserProgressRepo::upsert(&pool, user, resource, Some(instance_a), true)
        .await
        .unwrap();

    // Instance B's snapshot, checked against the ledger, sees the
    // completion even though B's row was never written.
    let instance_b = InstanceRepo::find_by_id(&pool, instance_b)
        .await
        .unwrap()
        .unwrap();
    let completed =
        UserProgressRepo::completed_ids(&pool, user, &instance_b.snapshot_resource_ids)
            .await
            .unwrap();
    assert_eq!(completed, vec![resource]);
    // And B's cached hint is stale-empty, which is exactly why reads must
    // reconcile from the ledger.
    assert!(instance_b.completed_resources.is_empty());
}

#[sqlx::test]
async fn retoggle_restores_completion_with_fresh_timestamp(pool: PgPool) {
    let user = make_user(&pool, "uid-1", "a@x.io").await;
    let resource = make_article(&pool, "https://x.io/r", 15).await;

    let first = UserProgressRepo::upsert(&pool, user, resource, None, true)
        .await
        .unwrap();
    let first_completed_at = first.completed_at.expect("completed_at should be stamped");

    let cleared = UserProgressRepo::upsert(&pool, user, resource, None, false)
        .await
        .unwrap();
    assert!(!cleared.completed);
    assert_eq!(cleared.completed_at, None);

    let again = UserProgressRepo::upsert(&pool, user, resource, None, true)
        .await
        .unwrap();
    assert!(again.completed);
    let again_completed_at = again.completed_at.expect("completed_at should be restamped");
    assert!(again_completed_at >= first_completed_at);

    // Still a single ledger row for the (user, resource) pair.
    let all = UserProgressRepo::list_for_user(&pool, user).await.unwrap();
    assert_eq!(all.len(), 1);
}

// ---------------------------------------------------------------------------
// Completion hint maintenance
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn completion_hint_is_deduplicated(pool: PgPool) {
    let user = make_user(&pool, "uid-1", "a@x.io").await;
    let resource = make_article(&pool, "https://x.io/r", 15).await;
    let plan = make_plan(&pool, user, &[resource]).await;
    let instance = make_instance(&pool, user, plan).await;

    InstanceRepo::add_completed(&pool, instance, resource).await.unwrap();
    InstanceRepo::add_completed(&pool, instance, resource).await.unwrap();

    let row = InstanceRepo::find_by_id(&pool, instance).await.unwrap().unwrap();
    assert_eq!(row.completed_resources, vec![resource]);

    InstanceRepo::remove_completed(&pool, instance, resource).await.unwrap();
    let row = InstanceRepo::find_by_id(&pool, instance).await.unwrap().unwrap();
    assert!(row.completed_resources.is_empty());
}

// ---------------------------------------------------------------------------
// Share entries
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn duplicate_share_violates_unique_constraint(pool: PgPool) {
    let creator = make_user(&pool, "uid-1", "a@x.io").await;
    let plan = make_plan(&pool, creator, &[]).await;

    PlanShareRepo::create(&pool, plan, "b@x.io", "viewer", None)
        .await
        .expect("first share should succeed");

    let second = PlanShareRepo::create(&pool, plan, "b@x.io", "editor", None).await;
    let err = second.expect_err("second share for the same email must fail");
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.constraint(), Some("uq_plan_shares_plan_email"));
        }
        other => panic!("expected a unique violation, got {other:?}"),
    }
}

#[sqlx::test]
async fn email_only_share_is_claimed_on_registration(pool: PgPool) {
    let creator = make_user(&pool, "uid-1", "a@x.io").await;
    let plan = make_plan(&pool, creator, &[]).await;

    PlanShareRepo::create(&pool, plan, "b@x.io", "editor", None)
        .await
        .unwrap();

    // The invitee registers later; the pending entry resolves to them.
    let invitee = make_user(&pool, "uid-2", "b@x.io").await;
    let claimed = PlanShareRepo::claim_for_user(&pool, invitee, "b@x.io")
        .await
        .unwrap();
    assert_eq!(claimed, 1);

    let shares = PlanShareRepo::list_for_plan(&pool, plan).await.unwrap();
    assert_eq!(shares.len(), 1);
    assert_eq!(shares[0].user_id, Some(invitee));

    // Claiming again is a no-op.
    let reclaimed = PlanShareRepo::claim_for_user(&pool, invitee, "b@x.io")
        .await
        .unwrap();
    assert_eq!(reclaimed, 0);
}

// ---------------------------------------------------------------------------
// Advisory counters
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn negative_counter_is_clamped_on_read(pool: PgPool) {
    let creator = make_user(&pool, "uid-1", "a@x.io").await;
    let plan = make_plan(&pool, creator, &[]).await;

    // Drive the stored counter below zero, as racing deletes can.
    StudyPlanRepo::bump_instance_count(&pool, plan, -3).await.unwrap();

    let row = StudyPlanRepo::find_by_id(&pool, plan).await.unwrap().unwrap();
    assert_eq!(row.instance_count, 0);

    // The raw stored value really is negative.
    let raw: i64 = sqlx::query_scalar("SELECT instance_count FROM study_plans WHERE id = $1")
        .bind(plan)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(raw, -3);
}
