//! Repository tests against a real PostgreSQL instance.
//!
//! Run with `DATABASE_URL` pointing at a scratch server and `--ignored`.

use assert_matches::assert_matches;
use chrono::{TimeDelta, TimeZone, Utc};
use sqlx::PgPool;

use certtrack_core::academic_calendar::academic_year_bounds;
use certtrack_core::dashboard::{CountsDelta, SubmissionCounts};
use certtrack_core::types::Timestamp;
use certtrack_db::models::academic_year::AcademicYear;
use certtrack_db::models::certificate_type::CreateCertificateType;
use certtrack_db::models::notification::{NewNotification, NewRecipient};
use certtrack_db::models::program::CreateProgram;
use certtrack_db::models::program_requirement::{
    CreateProgramRequirement, ProgramRequirement, UpdateProgramRequirement,
};
use certtrack_db::models::schedule::NewSchedule;
use certtrack_db::models::status::RecipientStatus;
use certtrack_db::models::student::CreateStudent;
use certtrack_db::repositories::*;

fn ts(y: i32, m: u32, d: u32) -> Timestamp {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

async fn academic_year(pool: &PgPool, year_code: i32) -> AcademicYear {
    let (start, end) = academic_year_bounds(year_code).unwrap();
    AcademicYearRepo::get_or_create(pool, year_code, start, end)
        .await
        .unwrap()
}

async fn requirement(pool: &PgPool) -> ProgramRequirement {
    let program = ProgramRepo::create(
        pool,
        &CreateProgram {
            code: "NUR".into(),
            name: "Nursing".into(),
            duration_years: 4,
            is_active: None,
        },
    )
    .await
    .unwrap();
    let cert = CertificateTypeRepo::create(
        pool,
        &CreateCertificateType {
            code: "CPR".into(),
            name: "CPR certificate".into(),
            is_active: None,
        },
    )
    .await
    .unwrap();
    ProgramRequirementRepo::create(
        pool,
        &CreateProgramRequirement {
            program_id: program.id,
            certificate_type_id: cert.id,
            name: "CPR".into(),
            target_year: 2,
            deadline_day: 15,
            deadline_month: 3,
            grace_period_days: None,
            notification_days_before_deadline: None,
            is_mandatory: None,
            special_instruction: None,
            recurrence_type_id: None,
            effective_from_year: Some(2024),
            effective_until_year: Some(2030),
            months_before_deadline: Some(2),
        },
    )
    .await
    .unwrap()
}

fn new_schedule(requirement_id: uuid::Uuid, academic_year_id: uuid::Uuid) -> NewSchedule {
    let deadline = ts(2026, 3, 15);
    NewSchedule {
        program_requirement_id: requirement_id,
        academic_year_id,
        submission_deadline: deadline,
        grace_period_deadline: deadline + TimeDelta::days(7),
        start_notify_at: deadline - TimeDelta::days(90),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn requirement_defaults_are_applied(pool: PgPool) {
    certtrack_db::health_check(&pool).await.unwrap();
    let req = requirement(&pool).await;
    assert_eq!(req.grace_period_days, 7);
    assert_eq!(req.notification_days_before_deadline, 90);
    assert!(req.is_mandatory);
    assert!(req.is_active);
    assert_eq!(req.recurrence_type_id, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_schedule_reports_constraint(pool: PgPool) {
    let req = requirement(&pool).await;
    let ay = academic_year(&pool, 2024).await;

    ScheduleRepo::create(&pool, &new_schedule(req.id, ay.id))
        .await
        .unwrap();
    let err = ScheduleRepo::create(&pool, &new_schedule(req.id, ay.id))
        .await
        .unwrap_err();
    assert_eq!(
        certtrack_db::unique_violation(&err).as_deref(),
        Some("uq_req_sched_req_year")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn latest_scheduled_year_and_archive(pool: PgPool) {
    let req = requirement(&pool).await;
    for year in [2024, 2026, 2025] {
        let ay = academic_year(&pool, year).await;
        ScheduleRepo::create(&pool, &new_schedule(req.id, ay.id))
            .await
            .unwrap();
    }
    let latest = ProgramRequirementRepo::latest_scheduled_year_code(&pool, req.id)
        .await
        .unwrap();
    assert_eq!(latest, Some(2026));
    assert_eq!(
        ProgramRequirementRepo::scheduled_year_codes(&pool, req.id)
            .await
            .unwrap(),
        vec![2024, 2025, 2026]
    );

    let archived = ProgramRequirementRepo::archive(&pool, req.id, latest)
        .await
        .unwrap()
        .unwrap();
    assert!(!archived.is_active);
    assert_eq!(archived.effective_until_year, Some(2026));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn update_keeps_unset_fields(pool: PgPool) {
    let req = requirement(&pool).await;
    let updated = ProgramRequirementRepo::update(
        &pool,
        req.id,
        &UpdateProgramRequirement {
            grace_period_days: Some(14),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.grace_period_days, 14);
    assert_eq!(updated.name, req.name);
    assert_eq!(updated.deadline_month, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn archive_expired_only_touches_past_ranges(pool: PgPool) {
    let req = requirement(&pool).await;
    assert_eq!(
        ProgramRequirementRepo::archive_expired(&pool, 2030).await.unwrap(),
        0
    );
    assert_eq!(
        ProgramRequirementRepo::archive_expired(&pool, 2031).await.unwrap(),
        1
    );
    let reloaded = ProgramRequirementRepo::find_by_id(&pool, req.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!reloaded.is_active);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn notifiable_window_and_details(pool: PgPool) {
    let req = requirement(&pool).await;
    let ay = academic_year(&pool, 2024).await;
    let schedule = ScheduleRepo::create(&pool, &new_schedule(req.id, ay.id))
        .await
        .unwrap();

    let inside = ts(2026, 1, 1);
    let before = ts(2025, 12, 1);
    let after = ts(2026, 4, 1);
    assert_eq!(ScheduleRepo::list_notifiable(&pool, inside).await.unwrap().len(), 1);
    assert!(ScheduleRepo::list_notifiable(&pool, before).await.unwrap().is_empty());
    assert!(ScheduleRepo::list_notifiable(&pool, after).await.unwrap().is_empty());

    DashboardStatsRepo::create_for_schedule(&pool, schedule.id, &SubmissionCounts::for_cohort(3))
        .await
        .unwrap();
    let details = ScheduleRepo::list_with_details(&pool).await.unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].program_code, "NUR");
    assert_eq!(details[0].year_code, 2024);
    assert_eq!(details[0].not_submitted_count, Some(3));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn dashboard_counts_update_and_constraints(pool: PgPool) {
    let req = requirement(&pool).await;
    let ay = academic_year(&pool, 2024).await;
    let schedule = ScheduleRepo::create(&pool, &new_schedule(req.id, ay.id))
        .await
        .unwrap();
    let stats = DashboardStatsRepo::create_for_schedule(
        &pool,
        schedule.id,
        &SubmissionCounts::for_cohort(2),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(
        DashboardStatsRepo::create_for_schedule(&pool, schedule.id, &SubmissionCounts::default())
            .await
            .unwrap()
            .is_none()
    );

    let next = stats
        .counts()
        .apply(&CountsDelta {
            submitted_count: 1,
            approved_count: 1,
            not_submitted_count: -1,
            late_submissions: 1,
            ..CountsDelta::default()
        })
        .unwrap();
    let saved = DashboardStatsRepo::update_counts(&pool, schedule.id, &next)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.counts(), next);

    let broken = SubmissionCounts {
        submitted_count: 5,
        ..next
    };
    assert_matches!(
        DashboardStatsRepo::update_counts(&pool, schedule.id, &broken).await,
        Err(sqlx::Error::Database(_))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn notification_lifecycle(pool: PgPool) {
    let req = requirement(&pool).await;
    let ay = academic_year(&pool, 2024).await;
    let student = StudentRepo::create(
        &pool,
        &CreateStudent {
            student_code: "6400001".into(),
            first_name: "Malee".into(),
            last_name: "Srisuk".into(),
            program_id: req.program_id,
            academic_year_id: ay.id,
            line_user_id: Some("U123".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(
        StudentRepo::count_active_in_cohort(&pool, req.program_id, ay.id)
            .await
            .unwrap(),
        1
    );

    let now = ts(2026, 1, 1);
    let (notification, recipients) = NotificationRepo::create_with_recipients(
        &pool,
        &NewNotification {
            notification_code: "program_requirement_schedule_remind".into(),
            entity_type: "program_requirement_schedule".into(),
            entity_id: req.id,
            actor_type: "scheduled".into(),
            actor_id: None,
            request_id: None,
            priority_id: 2,
            subject: "Reminder".into(),
            body: "Body".into(),
            line_subject: "Reminder".into(),
            line_body: "Body".into(),
            metadata: serde_json::json!({ "daysRemaining": 73 }),
            scheduled_for: None,
            expires_at: Some(now + TimeDelta::days(15)),
        },
        &[NewRecipient {
            student_id: student.id,
            in_app_enabled: true,
            line_app_enabled: true,
        }],
    )
    .await
    .unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0].status_id, RecipientStatus::Delivered.id());
    assert_eq!(notification.metadata["daysRemaining"], 73);

    NotificationRepo::mark_line_sent(&pool, recipients[0].id).await.unwrap();
    assert_eq!(NotificationRepo::unread_count(&pool, student.id).await.unwrap(), 1);
    let inbox = NotificationRepo::list_for_student(&pool, student.id, true, 10, 0)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);

    assert!(NotificationRepo::mark_read(&pool, recipients[0].id, student.id)
        .await
        .unwrap());
    assert_eq!(NotificationRepo::unread_count(&pool, student.id).await.unwrap(), 0);

    // Read notifications are not expired.
    assert_eq!(
        NotificationRepo::expire_due(&pool, now + TimeDelta::days(30))
            .await
            .unwrap(),
        0
    );
}
