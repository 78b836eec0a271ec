//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level seeds the filter
//! with sqlx statement logging capped at `warn`, since the repositories emit
//! one query span per call and the raw SQL adds nothing at `info`. Output is
//! JSON for log aggregation or pretty for local work, per `logging.format`.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// The filter directive used when `RUST_LOG` is absent.
fn default_directives(level: &str) -> String {
    format!("{level},sqlx::query=warn")
}

/// Installs the global tracing subscriber.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_current_span(true)
                    .with_target(true),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_quiet_sqlx() {
        assert_eq!(default_directives("info"), "info,sqlx::query=warn");
        assert_eq!(default_directives("debug"), "debug,sqlx::query=warn");
    }

    #[test]
    fn test_default_directives_parse_as_env_filter() {
        // EnvFilter::new panics only on hard parse failures; building one
        // proves the directive string is well formed.
        let _ = EnvFilter::new(default_directives("info"));
    }
}
