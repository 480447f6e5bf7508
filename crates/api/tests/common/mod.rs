//! Shared helpers for API integration tests.

use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;

use studyloom_api::auth::jwt::JwtConfig;
use studyloom_api::config::ServerConfig;
use studyloom_api::router::build_app_router;
use studyloom_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults and a known JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        cron_secret: None,
        reminder_poll_secs: None,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
        },
    }
}

/// Build the full application router over a lazily-connecting pool.
///
/// The pool never opens a connection until a handler touches the
/// database, so tests that exercise the middleware/auth layers (which
/// reject before any query) run without a live Postgres.
pub fn build_test_app() -> Router {
    let pool = PgPoolOptions::new()
        // Keep the health-check failure fast when a test does reach the
        // (absent) database.
        .acquire_timeout(std::time::Duration::from_millis(250))
        .connect_lazy("postgres://localhost:1/studyloom_test_unreachable")
        .expect("lazy pool construction should not fail");

    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        youtube: None,
        mailer: None,
    };

    build_app_router(state, &config)
}
