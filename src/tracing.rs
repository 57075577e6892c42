//! Tracing initialization.

use std::sync::Once;
use std::time::Instant;
use tracing_subscriber::{
    EnvFilter, fmt::format::FmtSpan, fmt::time::FormatTime, util::SubscriberInitExt,
};

static INIT: Once = Once::new();

/// Formats elapsed time since process start instead of a wall-clock timestamp,
/// so CLI progress output stays legible without date noise.
pub struct UptimeTimer {
    start: Instant,
}

impl Default for UptimeTimer {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl FormatTime for UptimeTimer {
    fn format_time(
        &self,
        w: &mut tracing_subscriber::fmt::format::Writer<'_>,
    ) -> std::fmt::Result {
        write!(w, "{:7.3}", self.start.elapsed().as_secs_f64())
    }
}

/// Initialize tracing at the given level (e.g. "info", "debug"). Safe to call
/// multiple times; only the first call takes effect.
pub fn init(level: &str) {
    INIT.call_once(|| {
        let is_test =
            std::env::var("NEXTEST").is_ok() || std::env::var("CARGO_TARGET_TMPDIR").is_ok();

        let filter = EnvFilter::try_new(level)
            .unwrap_or_else(|_| EnvFilter::new(if is_test { "debug" } else { "info" }));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_target(true)
            .with_timer(UptimeTimer::default())
            .with_span_events(FmtSpan::NONE)
            .compact();

        if is_test {
            builder.with_test_writer().finish().set_default();
        } else if let Err(e) = builder.with_writer(std::io::stderr).try_init() {
            eprintln!("Failed to initialize tracing: {}", e);
        }
    });
}
