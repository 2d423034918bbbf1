//! Monthly schedule planner.
//!
//! For every active requirement with a planning lead, works out which cohort
//! is in the requirement's target year now and, when the schedule's creation
//! date is at most 30 days away, creates that cohort's schedule together with
//! its dashboard counters.

use std::time::Duration;

use certtrack_core::academic_calendar::{academic_year_bounds, current_academic_year};
use certtrack_core::context::RequestContext;
use certtrack_core::dashboard::SubmissionCounts;
use certtrack_core::error::CoreError;
use certtrack_core::recurrence::{plan, recurrence_marker, PlanDecision, PlannedSchedule};
use certtrack_core::types::Timestamp;
use certtrack_db::models::program_requirement::ProgramRequirement;
use certtrack_db::models::schedule::{Schedule, ScheduleRequest};
use certtrack_db::repositories::{
    AcademicYearRepo, DashboardStatsRepo, ProgramRequirementRepo, StudentRepo,
};
use certtrack_db::DbPool;
use certtrack_scheduling::{ScheduleService, SchedulingStore};
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::JobError;

/// Actor name recorded on schedules and notifications the planner causes.
pub const JOB_NAME: &str = "schedule-planner";

/// Outcome counts of one planner cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlannerReport {
    pub processed: u32,
    pub created: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// Run the planner loop until `cancel` is triggered.
pub async fn run<S: SchedulingStore>(
    pool: DbPool,
    service: ScheduleService<S>,
    every: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = every.as_secs(), "Schedule planner started");
    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Schedule planner stopping");
                break;
            }
            _ = interval.tick() => {
                match plan_cycle(&pool, &service, Utc::now()).await {
                    Ok(report) => tracing::info!(
                        processed = report.processed,
                        created = report.created,
                        skipped = report.skipped,
                        failed = report.failed,
                        "Schedule planner cycle finished"
                    ),
                    Err(e) => tracing::error!(error = %e, "Schedule planner cycle failed"),
                }
            }
        }
    }
}

/// One planner pass at `now`. Fails only when the requirement list cannot
/// be loaded; per-requirement failures are counted.
pub async fn plan_cycle<S: SchedulingStore>(
    pool: &DbPool,
    service: &ScheduleService<S>,
    now: Timestamp,
) -> Result<PlannerReport, sqlx::Error> {
    let current_year = current_academic_year(now);
    let requirements = ProgramRequirementRepo::list_active_recurring(pool).await?;
    let ctx = RequestContext::scheduled(JOB_NAME);
    let mut report = PlannerReport::default();

    for requirement in &requirements {
        report.processed += 1;

        let scheduled =
            match ProgramRequirementRepo::scheduled_year_codes(pool, requirement.id).await {
                Ok(years) => years,
                Err(e) => {
                    tracing::error!(
                        program_requirement_id = %requirement.id,
                        error = %e,
                        "Failed to load scheduled years"
                    );
                    report.failed += 1;
                    continue;
                }
            };

        let planned = match plan(&requirement.recurring(), current_year, &scheduled, now) {
            PlanDecision::Create(planned) => planned,
            PlanDecision::Skip(reason) => {
                tracing::debug!(
                    program_requirement_id = %requirement.id,
                    ?reason,
                    "Requirement skipped"
                );
                report.skipped += 1;
                continue;
            }
        };

        match create_planned(pool, service, &ctx, requirement, &planned).await {
            Ok(schedule) => {
                tracing::info!(
                    schedule_id = %schedule.id,
                    program_requirement_id = %requirement.id,
                    cohort_year = planned.cohort_year,
                    "Planned schedule created"
                );
                report.created += 1;
            }
            Err(JobError::Core(CoreError::DuplicateSchedule { .. })) => {
                tracing::debug!(
                    program_requirement_id = %requirement.id,
                    "Schedule already exists"
                );
                report.skipped += 1;
            }
            Err(e) => {
                tracing::error!(
                    program_requirement_id = %requirement.id,
                    cohort_year = planned.cohort_year,
                    error = %e,
                    "Failed to create planned schedule"
                );
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

async fn create_planned<S: SchedulingStore>(
    pool: &DbPool,
    service: &ScheduleService<S>,
    ctx: &RequestContext,
    requirement: &ProgramRequirement,
    planned: &PlannedSchedule,
) -> Result<Schedule, JobError> {
    let (start, end) = academic_year_bounds(planned.cohort_year).ok_or_else(|| {
        CoreError::DateConstraintViolation(format!(
            "academic year {} has no valid bounds",
            planned.cohort_year
        ))
    })?;
    let academic_year =
        AcademicYearRepo::get_or_create(pool, planned.cohort_year, start, end).await?;

    let request = ScheduleRequest {
        program_requirement_id: requirement.id,
        academic_year_id: academic_year.id,
        submission_deadline: planned.submission_deadline,
        grace_period_days: None,
        notification_days_before_deadline: None,
    };
    let schedule = service.derive_and_create(ctx, &request).await?;

    let cohort_size =
        StudentRepo::count_active_in_cohort(pool, requirement.program_id, academic_year.id).await?;
    let counts = SubmissionCounts::for_cohort(i32::try_from(cohort_size).unwrap_or(i32::MAX));
    DashboardStatsRepo::create_for_schedule(pool, schedule.id, &counts).await?;

    if let Some(marker) = recurrence_marker(planned.cohort_year) {
        ProgramRequirementRepo::set_last_recurrence(pool, requirement.id, marker).await?;
    }

    Ok(schedule)
}
