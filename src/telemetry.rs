//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL controls the filter (e.g. "debug" or directives like
//!   "info,scoring=debug,store=info,tower_http=info").
//! - LOG_FORMAT selects "pretty" (default), "compact" or "json" structured logs.
//!
//! Targets used across the crate: `postedit` (service + transport),
//! `scoring` (metric providers, points), `store` (submission bookkeeping).

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,postedit=debug,scoring=debug,store=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Each format yields a different subscriber type; init per branch.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().with_current_span(true).init(),
        Ok("compact") => builder.compact().init(),
        _ => builder.init(),
    }
}
