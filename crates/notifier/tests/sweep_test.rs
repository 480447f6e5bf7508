//! Reminder-sweep tests against a migrated database.
//!
//! SMTP is never configured here, so every due reminder takes the
//! delivery-failure path: it is counted as failed, nothing is logged to
//! `sent_reminders`, and the pair stays pending for the next sweep.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use studyloom_core::types::{DbId, Timestamp};
use studyloom_db::models::study_plan::CreateStudyPlan;
use studyloom_db::models::user::UpdateNotificationSettings;
use studyloom_db::repositories::{InstanceRepo, SentReminderRepo, StudyPlanRepo, UserRepo};
use studyloom_notifier::run_sweep;

async fn make_instance(pool: &PgPool, uid: &str, email: &str, end_date: Timestamp) -> DbId {
    let user = UserRepo::ensure(pool, uid, email, "").await.unwrap().id;
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
    InstanceRepo::create(
        pool,
        user,
        plan.id,
        None,
        &[],
        end_date - Duration::days(30),
        end_date,
        &serde_json::json!([]),
        None,
        &serde_json::json!({}),
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../db/migrations")]
async fn due_rules_without_mailer_stay_pending(pool: PgPool) {
    let now = Utc::now();
    // Deadline in 12 hours: all three default rules (7d/3d/1d lead) are
    // inside their fire window.
    let instance = make_instance(&pool, "uid-1", "a@x.io", now + Duration::hours(12)).await;

    let stats = run_sweep(&pool, None, now).await.unwrap();
    assert_eq!(stats.checked, 1);
    assert_eq!(stats.sent, 0);
    assert_eq!(stats.failed, 3);

    // Nothing was logged, so a second sweep retries the same rules.
    let log = SentReminderRepo::list_for_instance(&pool, instance).await.unwrap();
    assert!(log.is_empty());

    let again = run_sweep(&pool, None, now).await.unwrap();
    assert_eq!(again.failed, 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn far_deadlines_fire_nothing(pool: PgPool) {
    let now = Utc::now();
    make_instance(&pool, "uid-1", "a@x.io", now + Duration::days(30)).await;

    let stats = run_sweep(&pool, None, now).await.unwrap();
    assert_eq!(stats.checked, 1);
    assert_eq!(stats.sent, 0);
    assert_eq!(stats.failed, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn past_deadlines_are_not_swept(pool: PgPool) {
    let now = Utc::now();
    make_instance(&pool, "uid-1", "a@x.io", now - Duration::hours(1)).await;

    let stats = run_sweep(&pool, None, now).await.unwrap();
    assert_eq!(stats.checked, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn disabled_email_reminders_are_skipped(pool: PgPool) {
    let now = Utc::now();
    make_instance(&pool, "uid-1", "a@x.io", now + Duration::hours(12)).await;

    let user = UserRepo::find_by_email(&pool, "a@x.io").await.unwrap().unwrap();
    UserRepo::update_settings(
        &pool,
        user.id,
        &UpdateNotificationSettings {
            email_reminders_enabled: Some(false),
            reminder_time: None,
            frequency: None,
            custom_days: None,
            custom_reminders: None,
        },
    )
    .await
    .unwrap();

    let stats = run_sweep(&pool, None, now).await.unwrap();
    assert_eq!(stats.checked, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.sent, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn already_logged_rules_do_not_refire(pool: PgPool) {
    let now = Utc::now();
    let instance = make_instance(&pool, "uid-1", "a@x.io", now + Duration::hours(12)).await;

    // Pretend all three defaults were delivered by an earlier sweep.
    for rule_id in ["due-7d", "due-3d", "due-1d"] {
        SentReminderRepo::record(&pool, instance, rule_id).await.unwrap();
    }

    let stats = run_sweep(&pool, None, now).await.unwrap();
    assert_eq!(stats.checked, 1);
    assert_eq!(stats.sent, 0);
    assert_eq!(stats.failed, 0);
}
