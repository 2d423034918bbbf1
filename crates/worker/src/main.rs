use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certtrack_events::{EventBus, LineConfig, LinePushDelivery, NotificationRouter};
use certtrack_scheduling::{PgSchedulingStore, ScheduleService, SchedulingConfig};
use certtrack_worker::config::{LogFormat, WorkerConfig};
use certtrack_worker::jobs::{
    deadline_notifier, notification_expiry, requirement_archiver, schedule_planner,
};

/// How long each background task gets to finish after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "certtrack_worker=debug,certtrack_events=debug,certtrack_scheduling=debug,certtrack_db=info"
            .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Plain => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    let scheduling = SchedulingConfig::from_env();
    tracing::info!(?config, ?scheduling, "Loaded worker configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = certtrack_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    certtrack_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    certtrack_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event bus and notification routing ---
    let event_bus = Arc::new(EventBus::default());

    let line = match LineConfig::from_env() {
        Some(line_config) => {
            let delivery =
                LinePushDelivery::new(line_config).expect("Failed to build LINE push client");
            tracing::info!("LINE push delivery enabled");
            Some(Arc::new(delivery))
        }
        None => {
            tracing::info!("LINE_CHANNEL_ACCESS_TOKEN not set, LINE push delivery disabled");
            None
        }
    };
    let router = NotificationRouter::new(pool.clone(), line);
    let router_handle = tokio::spawn(router.run(event_bus.subscribe()));

    // --- Jobs ---
    let cancel = CancellationToken::new();
    let schedule_service = ScheduleService::new(PgSchedulingStore::new(pool.clone()), scheduling)
        .with_events(Arc::clone(&event_bus));

    let job_handles = vec![
        tokio::spawn(schedule_planner::run(
            pool.clone(),
            schedule_service,
            config.planner_interval,
            cancel.clone(),
        )),
        tokio::spawn(requirement_archiver::run(
            pool.clone(),
            config.archiver_interval,
            cancel.clone(),
        )),
        tokio::spawn(deadline_notifier::run(
            pool.clone(),
            Arc::clone(&event_bus),
            config.notifier_interval,
            cancel.clone(),
        )),
        tokio::spawn(notification_expiry::run(
            pool.clone(),
            config.expiry_interval,
            cancel.clone(),
        )),
    ];
    tracing::info!("Worker started (planner, archiver, notifier, expiry, notification router)");

    shutdown_signal().await;

    // --- Shutdown ---
    cancel.cancel();
    for handle in job_handles {
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, handle).await;
    }
    tracing::info!("Jobs stopped");

    // The jobs held the remaining bus clones; dropping ours closes the
    // channel and ends the router loop.
    drop(event_bus);
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, router_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
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
