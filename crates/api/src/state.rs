use std::sync::Arc;

use studyloom_notifier::Mailer;
use studyloom_youtube::YouTubeClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: studyloom_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// YouTube Data API client; `None` when no API key is configured.
    pub youtube: Option<Arc<YouTubeClient>>,
    /// SMTP mailer; `None` when SMTP is not configured.
    pub mailer: Option<Arc<Mailer>>,
}
