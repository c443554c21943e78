//! Logging setup for applications embedding the portal core
//!
//! Library crates only emit `tracing` events; the host application calls
//! [`init_logging`] once at startup to install a subscriber.
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: "json" for JSON lines, anything else for text (default: text)
//! - `RUST_LOG`: level filter (default: `info`), e.g. `RUST_LOG=fc_auth=debug`

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("LOG_FORMAT").unwrap_or_default())
    }

    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Build the level filter from `RUST_LOG`, falling back to `default_directive`.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed (tests, embedding
/// hosts that configured tracing themselves).
pub fn init_logging(app_name: &str) -> bool {
    let format = LogFormat::from_env();
    let filter = env_filter("info");

    let installed = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .flatten_event(true),
            )
            .try_init()
            .is_ok(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_ansi(true))
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(app = app_name, ?format, "Logging initialised");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse(""), LogFormat::Text);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Text);
    }

    #[test]
    fn test_second_init_is_rejected() {
        init_logging("fc-common-test");
        assert!(!init_logging("fc-common-test"));
    }
}
