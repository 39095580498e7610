//! Structured JSON logging, one object per line to stdout.
//!
//! Built on `tracing-subscriber`'s `json` formatter rather than a hand-rolled
//! encoder, per the workspace's ecosystem choice. Timestamps are RFC3339 UTC
//! with a trailing `Z`, matching the original distillation's formatter
//! rather than `tracing-subscriber`'s default `+00:00` offset suffix.

use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

/// `FormatTime` impl producing `2024-01-01T00:00:00.000000Z` instead of
/// `tracing-subscriber`'s default `+00:00` suffix.
struct RFC3339Zulu;

impl FormatTime for RFC3339Zulu {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
    }
}

/// Initialize the global subscriber. Call once, at process start.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_timer(RFC3339Zulu)
        .with_target(true)
        .flatten_event(true)
        .init();
}
