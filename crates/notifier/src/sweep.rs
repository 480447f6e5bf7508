//! One pass of the reminder scheduler.
//!
//! For every `(active instance, reminder rule)` pair the state machine is
//! `pending -> sent`, terminal and idempotent: the `sent_reminders` log is
//! consulted before sending and appended to only on success, so a delivery
//! failure leaves the pair pending and it is retried on the next sweep
//! (unbounded, no backoff). A rule only fires inside the strict
//! `[deadline - offset, deadline]` bracket -- if the sweep cadence exceeds a
//! rule's lead time the bracket can be skipped entirely. That gap is
//! inherited behaviour; there is deliberately no catch-up grace.

use studyloom_core::reminders::{default_rules, is_due, merge_rules, ReminderRule};
use studyloom_core::types::Timestamp;
use studyloom_db::models::instance::PlanInstance;
use studyloom_db::models::user::User;
use studyloom_db::repositories::{
    InstanceRepo, SentReminderRepo, StudyPlanRepo, UserRepo,
};
use studyloom_db::DbPool;

use crate::email::Mailer;

/// Why a single reminder delivery failed (the pair stays pending).
#[derive(Debug, thiserror::Error)]
enum DeliveryError {
    #[error("SMTP is not configured")]
    MailerUnconfigured,
    #[error(transparent)]
    Email(#[from] crate::email::EmailError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Outcome of one sweep, reported by the cron endpoint.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct SweepStats {
    /// Active instances examined.
    pub checked: usize,
    /// Emails delivered and logged.
    pub sent: usize,
    /// Due reminders whose delivery failed; they stay pending.
    pub failed: usize,
}

/// Walk active instances and deliver every newly-due reminder.
///
/// `now` is injected so tests (and the cron endpoint) pin the evaluation
/// instant. With no mailer configured, due reminders count as failed and
/// stay pending.
pub async fn run_sweep(
    pool: &DbPool,
    mailer: Option<&Mailer>,
    now: Timestamp,
) -> Result<SweepStats, sqlx::Error> {
    let instances = InstanceRepo::list_active_due(pool, now).await?;

    let mut stats = SweepStats {
        checked: instances.len(),
        ..Default::default()
    };

    for instance in &instances {
        if let Err(e) = sweep_instance(pool, mailer, now, instance, &mut stats).await {
            // One instance's storage failure must not starve the rest.
            tracing::error!(
                instance_id = instance.id,
                error = %e,
                "Failed to evaluate reminders for instance"
            );
        }
    }

    if stats.sent > 0 || stats.failed > 0 {
        tracing::info!(
            checked = stats.checked,
            sent = stats.sent,
            failed = stats.failed,
            "Reminder sweep finished"
        );
    }

    Ok(stats)
}

/// Evaluate and deliver the due reminders of a single instance.
async fn sweep_instance(
    pool: &DbPool,
    mailer: Option<&Mailer>,
    now: Timestamp,
    instance: &PlanInstance,
    stats: &mut SweepStats,
) -> Result<(), sqlx::Error> {
    let Some(user) = UserRepo::find_by_id(pool, instance.user_id).await? else {
        return Ok(());
    };

    let settings = UserRepo::settings_for(pool, user.id).await?;
    if !settings.email_reminders_enabled {
        return Ok(());
    }

    // Instance-level rules shadow the user's defaults rule-by-rule.
    let user_rules: Vec<ReminderRule> =
        serde_json::from_value(settings.custom_reminders.clone()).unwrap_or_default();
    let user_rules = if user_rules.is_empty() {
        default_rules()
    } else {
        user_rules
    };
    let rules = merge_rules(&instance.reminder_rules(), &user_rules);

    for rule in &rules {
        if !is_due(now, instance.end_date, rule.offset_mins) {
            continue;
        }
        if SentReminderRepo::was_sent(pool, instance.id, &rule.id).await? {
            continue;
        }

        match deliver(pool, mailer, instance, &user, rule).await {
            Ok(()) => stats.sent += 1,
            Err(e) => {
                stats.failed += 1;
                tracing::warn!(
                    instance_id = instance.id,
                    rule_id = %rule.id,
                    error = %e,
                    "Reminder delivery failed; left pending for next sweep"
                );
            }
        }
    }

    Ok(())
}

/// Send one reminder email and log it. Success appends to
/// `sent_reminders`; any failure propagates so the pair stays pending.
async fn deliver(
    pool: &DbPool,
    mailer: Option<&Mailer>,
    instance: &PlanInstance,
    user: &User,
    rule: &ReminderRule,
) -> Result<(), DeliveryError> {
    let mailer = mailer.ok_or(DeliveryError::MailerUnconfigured)?;

    let plan_title = match StudyPlanRepo::find_by_id(pool, instance.plan_id).await? {
        Some(plan) => plan.title,
        None => "your study plan".to_string(),
    };
    let display_title = instance.title.clone().unwrap_or(plan_title);

    let subject = format!("[Studyloom] Reminder: {display_title}");
    let body = format!(
        "Hi {},\n\n{} - {}.\n\nDeadline: {}\n\nKeep going!",
        if user.display_name.is_empty() {
            &user.email
        } else {
            &user.display_name
        },
        display_title,
        rule.label,
        instance.end_date.format("%Y-%m-%d %H:%M UTC"),
    );

    mailer.send(&user.email, &subject, &body).await?;

    // A `false` here means a concurrent sweep logged the pair first; the
    // duplicate send already happened, so there is nothing left to do.
    let recorded = SentReminderRepo::record(pool, instance.id, &rule.id).await?;
    if !recorded {
        tracing::debug!(
            instance_id = instance.id,
            rule_id = %rule.id,
            "Reminder was concurrently recorded by another sweep"
        );
    }

    Ok(())
}
