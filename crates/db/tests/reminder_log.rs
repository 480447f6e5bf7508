//! Tests for the `sent_reminders` at-most-once log.

use sqlx::PgPool;

use studyloom_core::types::DbId;
use studyloom_db::models::study_plan::CreateStudyPlan;
use studyloom_db::repositories::{InstanceRepo, SentReminderRepo, StudyPlanRepo, UserRepo};

async fn make_instance(pool: &PgPool) -> DbId {
    let user = UserRepo::ensure(pool, "uid-1", "a@x.io", "")
        .await
        .unwrap()
        .id;
    let plan = StudyPlanRepo::create(
        pool,
        user,
        &CreateStudyPlan {
            title: "Plan".to_string(),
            course_code: None,
            description: None,
            is_public: None,
            resource_ids: None,
        },
    )
    .await
    .unwrap();
    let now = chrono::Utc::now();
    InstanceRepo::create(
        pool,
        user,
        plan.id,
        None,
        &[],
        now,
        now + chrono::Duration::days(7),
        &serde_json::json!([]),
        None,
        &serde_json::json!({}),
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test]
async fn record_is_idempotent_per_rule(pool: PgPool) {
    let instance = make_instance(&pool).await;

    assert!(!SentReminderRepo::was_sent(&pool, instance, "due-1d").await.unwrap());

    // First record wins, the second reports the duplicate.
    assert!(SentReminderRepo::record(&pool, instance, "due-1d").await.unwrap());
    assert!(!SentReminderRepo::record(&pool, instance, "due-1d").await.unwrap());

    assert!(SentReminderRepo::was_sent(&pool, instance, "due-1d").await.unwrap());

    // A different rule on the same instance is unaffected.
    assert!(!SentReminderRepo::was_sent(&pool, instance, "due-7d").await.unwrap());
    assert!(SentReminderRepo::record(&pool, instance, "due-7d").await.unwrap());

    let log = SentReminderRepo::list_for_instance(&pool, instance).await.unwrap();
    assert_eq!(log.len(), 2);
}
