//! Tracing setup for the `useful` binary and for hosts that want the same output.
//!
//! Logs go to stderr so command output on stdout stays machine readable. The level
//! comes from, in order: `USEFUL_LOG`, `RUST_LOG`, the level passed in. Without any
//! of them nothing is logged.

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "USEFUL_LOG";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Filter for the given fallback level, honoring the environment overrides.
pub fn env_filter(level: Option<&str>) -> Option<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Some(filter);
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Some(filter);
    }
    level.map(EnvFilter::new)
}

/// Install the global subscriber.
///
/// Returns `false` when nothing was installed, either because no level is
/// configured or because a subscriber already exists.
pub fn init_logging(level: Option<&str>, format: LogFormat) -> bool {
    let Some(filter) = env_filter(level) else {
        return false;
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_filter_precedence() {
        // SAFETY: serialized with other environment tests
        unsafe {
            std::env::remove_var(LOG_ENV);
            std::env::remove_var("RUST_LOG");
        }
        assert!(env_filter(None).is_none());
        assert_eq!(env_filter(Some("info")).unwrap().to_string(), "info");

        unsafe { std::env::set_var(LOG_ENV, "useful=trace") };
        assert_eq!(env_filter(Some("info")).unwrap().to_string(), "useful=trace");
        unsafe { std::env::remove_var(LOG_ENV) };
    }
}
