pub mod academic_year;
pub mod certificate_type;
pub mod dashboard_stats;
pub mod notification;
pub mod program;
pub mod program_requirement;
pub mod schedule;
pub mod status;
pub mod student;
