//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,generation=debug,storage=debug"). Directives that do not parse fall
//!   back to `DEFAULT_FILTER` with a warning once the subscriber is up.
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets: `kurikulum_backend` (process lifecycle), `generation` (model calls
//! and workflows), `storage` (slot reads and writes). Tower HTTP TraceLayer
//! adds per-request spans on top.

use tracing::warn;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str =
    "info,generation=debug,storage=debug,kurikulum_backend=debug,tower_http=info,axum=info";

/// Filter from a raw LOG_LEVEL value; `Err` carries the rejected directives.
fn build_filter(raw: Option<&str>) -> (EnvFilter, Result<(), String>) {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => (EnvFilter::new(DEFAULT_FILTER), Ok(())),
        Some(directives) => match EnvFilter::try_new(directives) {
            Ok(filter) => (filter, Ok(())),
            Err(e) => (EnvFilter::new(DEFAULT_FILTER), Err(format!("{directives}: {e}"))),
        },
    }
}

pub fn init_tracing() {
    let raw = std::env::var("LOG_LEVEL").ok();
    let (filter, parsed) = build_filter(raw.as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }

    if let Err(rejected) = parsed {
        warn!(target: "kurikulum_backend", %rejected, "LOG_LEVEL ignored; using default filter");
    }
}
