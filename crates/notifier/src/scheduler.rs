//! Optional in-process reminder polling loop.
//!
//! [`ReminderScheduler`] drives [`crate::sweep::run_sweep`] on a fixed
//! interval for deployments that have no external cron hitting
//! `GET /cron/reminders`. The loop exits gracefully when the provided
//! [`CancellationToken`] is cancelled.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use studyloom_db::DbPool;

use crate::email::Mailer;
use crate::sweep::run_sweep;

/// Background service that runs the reminder sweep periodically.
pub struct ReminderScheduler {
    pool: DbPool,
    mailer: Option<Mailer>,
    interval: Duration,
}

impl ReminderScheduler {
    /// Create a new scheduler with the given pool, mailer, and poll
    /// interval.
    pub fn new(pool: DbPool, mailer: Option<Mailer>, interval: Duration) -> Self {
        Self {
            pool,
            mailer,
            interval,
        }
    }

    /// Run the sweep loop until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reminder scheduler cancelled");
                    break;
                }
                _ = interval.tick() => {
                    let now = chrono::Utc::now();
                    if let Err(e) = run_sweep(&self.pool, self.mailer.as_ref(), now).await {
                        tracing::error!(error = %e, "Reminder sweep failed");
                    }
                }
            }
        }
    }
}
