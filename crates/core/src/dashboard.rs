//! Dashboard submission counters for a schedule.
//!
//! Counts are maintained incrementally by the submission workflow. Every
//! change goes through [`SubmissionCounts::apply`] so a row never violates
//! the accounting identities below.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Counter values of one `dashboard_stats` row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionCounts {
    pub total_submissions_required: i32,
    pub submitted_count: i32,
    pub approved_count: i32,
    pub rejected_count: i32,
    pub pending_count: i32,
    pub manual_review_count: i32,
    pub not_submitted_count: i32,
    pub on_time_submissions: i32,
    pub late_submissions: i32,
    pub overdue_count: i32,
    pub manual_verification_count: i32,
    pub agent_verification_count: i32,
}

/// Signed change to each counter. Zero fields leave the counter alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountsDelta {
    pub total_submissions_required: i32,
    pub submitted_count: i32,
    pub approved_count: i32,
    pub rejected_count: i32,
    pub pending_count: i32,
    pub manual_review_count: i32,
    pub not_submitted_count: i32,
    pub on_time_submissions: i32,
    pub late_submissions: i32,
    pub overdue_count: i32,
    pub manual_verification_count: i32,
    pub agent_verification_count: i32,
}

impl SubmissionCounts {
    /// Fresh counters for a schedule whose cohort has `total_required` students.
    pub fn for_cohort(total_required: i32) -> Self {
        Self {
            total_submissions_required: total_required,
            not_submitted_count: total_required,
            ..Self::default()
        }
    }

    /// Check the accounting identities.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [
            ("total_submissions_required", self.total_submissions_required),
            ("submitted_count", self.submitted_count),
            ("approved_count", self.approved_count),
            ("rejected_count", self.rejected_count),
            ("pending_count", self.pending_count),
            ("manual_review_count", self.manual_review_count),
            ("not_submitted_count", self.not_submitted_count),
            ("on_time_submissions", self.on_time_submissions),
            ("late_submissions", self.late_submissions),
            ("overdue_count", self.overdue_count),
            ("manual_verification_count", self.manual_verification_count),
            ("agent_verification_count", self.agent_verification_count),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| *v < 0) {
            return Err(CoreError::Validation(format!("{name} is negative ({value})")));
        }

        let reviewed = self.approved_count
            + self.rejected_count
            + self.pending_count
            + self.manual_review_count;
        if self.submitted_count != reviewed {
            return Err(CoreError::Validation(format!(
                "submitted_count {} != approved + rejected + pending + manual_review ({reviewed})",
                self.submitted_count
            )));
        }
        if self.total_submissions_required != self.submitted_count + self.not_submitted_count {
            return Err(CoreError::Validation(format!(
                "total_submissions_required {} != submitted + not_submitted ({})",
                self.total_submissions_required,
                self.submitted_count + self.not_submitted_count
            )));
        }
        if self.submitted_count != self.on_time_submissions + self.late_submissions {
            return Err(CoreError::Validation(format!(
                "submitted_count {} != on_time + late ({})",
                self.submitted_count,
                self.on_time_submissions + self.late_submissions
            )));
        }
        Ok(())
    }

    /// Apply `delta` and return the new counters if they remain consistent.
    pub fn apply(&self, delta: &CountsDelta) -> Result<Self, CoreError> {
        let next = Self {
            total_submissions_required: self.total_submissions_required
                + delta.total_submissions_required,
            submitted_count: self.submitted_count + delta.submitted_count,
            approved_count: self.approved_count + delta.approved_count,
            rejected_count: self.rejected_count + delta.rejected_count,
            pending_count: self.pending_count + delta.pending_count,
            manual_review_count: self.manual_review_count + delta.manual_review_count,
            not_submitted_count: self.not_submitted_count + delta.not_submitted_count,
            on_time_submissions: self.on_time_submissions + delta.on_time_submissions,
            late_submissions: self.late_submissions + delta.late_submissions,
            overdue_count: self.overdue_count + delta.overdue_count,
            manual_verification_count: self.manual_verification_count
                + delta.manual_verification_count,
            agent_verification_count: self.agent_verification_count
                + delta.agent_verification_count,
        };
        next.validate()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn cohort_counts_start_unsubmitted() {
        let counts = SubmissionCounts::for_cohort(40);
        assert_eq!(counts.not_submitted_count, 40);
        assert!(counts.validate().is_ok());
    }

    #[test]
    fn on_time_submission_moves_one_student() {
        let counts = SubmissionCounts::for_cohort(3);
        let next = counts
            .apply(&CountsDelta {
                submitted_count: 1,
                pending_count: 1,
                not_submitted_count: -1,
                on_time_submissions: 1,
                agent_verification_count: 1,
                ..CountsDelta::default()
            })
            .unwrap();
        assert_eq!(next.submitted_count, 1);
        assert_eq!(next.not_submitted_count, 2);
        assert_eq!(next.agent_verification_count, 1);
    }

    #[test]
    fn unbalanced_delta_is_rejected() {
        let counts = SubmissionCounts::for_cohort(3);
        assert_matches!(
            counts.apply(&CountsDelta {
                submitted_count: 1,
                not_submitted_count: -1,
                on_time_submissions: 1,
                ..CountsDelta::default()
            }),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn negative_counts_are_rejected() {
        let counts = SubmissionCounts::for_cohort(0);
        assert_matches!(
            counts.apply(&CountsDelta {
                overdue_count: -1,
                ..CountsDelta::default()
            }),
            Err(CoreError::Validation(msg)) if msg.contains("overdue_count")
        );
    }
}
