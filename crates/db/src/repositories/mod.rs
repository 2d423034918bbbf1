//! Repository layer: one zero-sized struct per table with async query fns.

pub mod academic_year_repo;
pub mod certificate_type_repo;
pub mod dashboard_stats_repo;
pub mod notification_repo;
pub mod program_repo;
pub mod program_requirement_repo;
pub mod schedule_repo;
pub mod student_repo;

pub use academic_year_repo::AcademicYearRepo;
pub use certificate_type_repo::CertificateTypeRepo;
pub use dashboard_stats_repo::DashboardStatsRepo;
pub use notification_repo::NotificationRepo;
pub use program_repo::ProgramRepo;
pub use program_requirement_repo::ProgramRequirementRepo;
pub use schedule_repo::ScheduleRepo;
pub use student_repo::StudentRepo;
