//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! Behavior:
//! - LOG_LEVEL controls the filter (e.g. "debug" or detailed directives like
//!   "info,authoring=debug,lesson_blocks=debug,tower_http=info,axum=info").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets:
//! - `lesson_blocks`: process events (startup, config, record decoding).
//! - `authoring`: block lifecycle (drafts accepted/rejected, lesson writes).

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,authoring=debug,lesson_blocks=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}
