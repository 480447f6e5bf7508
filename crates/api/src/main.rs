use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studyloom_api::config::ServerConfig;
use studyloom_api::router::build_app_router;
use studyloom_api::state::AppState;
use studyloom_notifier::{EmailConfig, Mailer, ReminderScheduler};
use studyloom_youtube::{YouTubeClient, YouTubeConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyloom_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = studyloom_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    studyloom_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    studyloom_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- YouTube client (optional) ---
    let youtube = match YouTubeConfig::from_env() {
        Some(yt_config) => {
            tracing::info!("YouTube Data API client configured");
            Some(Arc::new(YouTubeClient::new(yt_config)))
        }
        None => {
            tracing::warn!("YOUTUBE_API_KEY not set; YouTube resources cannot be normalized");
            None
        }
    };

    // --- Mailer (optional) ---
    let email_config = EmailConfig::from_env();
    let mailer = match &email_config {
        Some(config) => {
            tracing::info!(host = %config.smtp_host, "SMTP mailer configured");
            Some(Arc::new(Mailer::new(config.clone())))
        }
        None => {
            tracing::warn!("SMTP_HOST not set; reminder and invitation emails disabled");
            None
        }
    };

    // --- Optional in-process reminder loop ---
    // Deployments with an external cron hitting GET /cron/reminders leave
    // this unset.
    let reminder_cancel = tokio_util::sync::CancellationToken::new();
    let reminder_handle = config.reminder_poll_secs.map(|secs| {
        let scheduler = ReminderScheduler::new(
            pool.clone(),
            email_config.clone().map(Mailer::new),
            Duration::from_secs(secs),
        );
        let cancel = reminder_cancel.clone();
        tracing::info!(poll_secs = secs, "In-process reminder scheduler enabled");
        tokio::spawn(async move {
            scheduler.run(cancel).await;
        })
    });

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        youtube,
        mailer,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    if let Some(handle) = reminder_handle {
        reminder_cancel.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Reminder scheduler stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
