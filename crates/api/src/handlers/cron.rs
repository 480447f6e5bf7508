//! Handler for `GET /cron/reminders` -- the externally-triggered reminder
//! sweep.
//!
//! Intended to be hit by a scheduled trigger (external cron, uptime
//! pinger). The endpoint is unauthenticated; when `CRON_SECRET` is
//! configured, callers must present it in the `x-cron-secret` header.
//! The sweep itself is idempotent, so overlapping or repeated triggers
//! are harmless.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use sha2::{Digest, Sha256};

use studyloom_core::error::CoreError;
use studyloom_notifier::{run_sweep, SweepStats};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /cron/reminders
pub async fn run_reminders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<DataResponse<SweepStats>>> {
    if let Some(expected) = &state.config.cron_secret {
        let provided = headers
            .get("x-cron-secret")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !secrets_match(provided, expected) {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Missing or invalid cron secret".into(),
            )));
        }
    }

    let stats = run_sweep(&state.pool, state.mailer.as_deref(), chrono::Utc::now()).await?;

    Ok(Json(DataResponse { data: stats }))
}

/// Compare the shared secret by digest so the comparison cost does not
/// depend on how much of the prefix matches.
fn secrets_match(provided: &str, expected: &str) -> bool {
    Sha256::digest(provided.as_bytes()) == Sha256::digest(expected.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secrets_pass() {
        assert!(secrets_match("s3cret", "s3cret"));
    }

    #[test]
    fn mismatched_secrets_fail() {
        assert!(!secrets_match("s3cret", "other"));
        assert!(!secrets_match("", "other"));
    }
}
