//! Annual requirement archiver.
//!
//! Deactivates requirements whose effective range ended before the current
//! academic year. Runs daily; the batch update is a no-op outside the first
//! days of a new academic year.

use std::time::Duration;

use certtrack_core::academic_calendar::current_academic_year;
use certtrack_db::repositories::ProgramRequirementRepo;
use certtrack_db::DbPool;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

/// Run the archiver loop until `cancel` is triggered.
pub async fn run(pool: DbPool, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Requirement archiver started");
    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Requirement archiver stopping");
                break;
            }
            _ = interval.tick() => {
                let academic_year = current_academic_year(Utc::now());
                match ProgramRequirementRepo::archive_expired(&pool, academic_year).await {
                    Ok(0) => {
                        tracing::debug!(academic_year, "Requirement archiver: nothing to archive");
                    }
                    Ok(archived) => {
                        tracing::info!(
                            academic_year,
                            archived,
                            "Requirement archiver: expired requirements archived"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Requirement archiver: batch update failed");
                    }
                }
            }
        }
    }
}
