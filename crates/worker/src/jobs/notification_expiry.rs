//! Periodic expiry of unread notifications past their `expires_at`.

use std::time::Duration;

use certtrack_db::repositories::NotificationRepo;
use certtrack_db::DbPool;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Run the expiry sweep until `cancel` is triggered.
pub async fn run(pool: DbPool, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Notification expiry job started");
    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Notification expiry job stopping");
                break;
            }
            _ = interval.tick() => {
                match NotificationRepo::expire_due(&pool, Utc::now()).await {
                    Ok(0) => tracing::debug!("Notification expiry: nothing expired"),
                    Ok(expired) => {
                        tracing::info!(expired, "Notification expiry: recipients expired");
                    }
                    Err(e) => tracing::error!(error = %e, "Notification expiry: sweep failed"),
                }
            }
        }
    }
}
