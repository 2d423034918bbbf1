//! Scheduling rule configuration loaded from environment variables.
//!
//! | Env var                      | Default                      |
//! |------------------------------|------------------------------|
//! | `SCHEDULE_WINDOW_ARITHMETIC` | `fixed_days`                 |
//! | `EFFECTIVE_UNTIL_RULE`       | `not_before_latest_schedule` |

use certtrack_core::academic_calendar::WindowArithmetic;
use certtrack_core::requirement::UntilYearRule;

/// Rules the scheduling services apply where the business has not settled
/// on a single behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulingConfig {
    /// How the end of a schedule's deadline window is computed.
    pub window: WindowArithmetic,
    /// How an updated `effective_until_year` is checked.
    pub until_rule: UntilYearRule,
}

impl SchedulingConfig {
    /// Load from the environment. Unset or unrecognised values fall back to
    /// the defaults with a warning.
    pub fn from_env() -> Self {
        let window = read("SCHEDULE_WINDOW_ARITHMETIC", WindowArithmetic::parse);
        let until_rule = read("EFFECTIVE_UNTIL_RULE", UntilYearRule::parse);
        Self {
            window: window.unwrap_or_default(),
            until_rule: until_rule.unwrap_or_default(),
        }
    }
}

fn read<T>(name: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        tracing::warn!(var = name, value = %raw, "Unrecognised value, using default");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_fixed_days_and_not_before_rule() {
        let config = SchedulingConfig::default();
        assert_eq!(config.window, WindowArithmetic::FixedDays);
        assert_eq!(config.until_rule, UntilYearRule::NotBeforeLatestSchedule);
    }

    #[test]
    fn reader_parses_known_values() {
        assert_eq!(
            WindowArithmetic::parse("Calendar"),
            Some(WindowArithmetic::Calendar)
        );
        assert_eq!(
            UntilYearRule::parse("not_after_latest_schedule"),
            Some(UntilYearRule::NotAfterLatestSchedule)
        );
        assert_eq!(UntilYearRule::parse("sometimes"), None);
    }
}
