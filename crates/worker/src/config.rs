//! Worker configuration loaded from environment variables.

use std::time::Duration;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Plain,
        }
    }
}

/// Job cadence and logging settings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Monthly schedule planner tick (default: daily).
    pub planner_interval: Duration,
    /// Requirement archiver tick (default: daily).
    pub archiver_interval: Duration,
    /// Deadline notifier tick (default: daily).
    pub notifier_interval: Duration,
    /// Notification expiry sweep tick (default: hourly).
    pub expiry_interval: Duration,
    pub log_format: LogFormat,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                             | Default |
    /// |-------------------------------------|---------|
    /// | `PLANNER_INTERVAL_SECS`             | `86400` |
    /// | `ARCHIVER_INTERVAL_SECS`            | `86400` |
    /// | `NOTIFIER_INTERVAL_SECS`            | `86400` |
    /// | `NOTIFICATION_EXPIRY_INTERVAL_SECS` | `3600`  |
    /// | `LOG_FORMAT`                        | `plain` |
    pub fn from_env() -> Self {
        Self {
            planner_interval: secs("PLANNER_INTERVAL_SECS", 86_400),
            archiver_interval: secs("ARCHIVER_INTERVAL_SECS", 86_400),
            notifier_interval: secs("NOTIFIER_INTERVAL_SECS", 86_400),
            expiry_interval: secs("NOTIFICATION_EXPIRY_INTERVAL_SECS", 3_600),
            log_format: std::env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
        }
    }
}

fn secs(name: &str, default: u64) -> Duration {
    let secs: u64 = std::env::var(name)
        .map(|v| {
            v.parse()
                .unwrap_or_else(|_| panic!("{name} must be a valid number of seconds"))
        })
        .unwrap_or(default);
    Duration::from_secs(secs.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_falls_back_to_plain() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Plain);
    }
}
