//! Platform-aware logging initialization.
//!
//! Native builds get a `tracing-subscriber` fmt layer filtered by `RUST_LOG`.
//! With the `web` feature, events are routed to the browser console instead.

use std::sync::Once;

use tracing::level_filters::LevelFilter;

static INIT: Once = Once::new();

/// localStorage key that overrides the browser console level.
pub const WEB_LOG_LEVEL_KEY: &str = "sessionLogLevel";

/// Initialize logging for the current platform.
///
/// Idempotent; an already-installed global subscriber is left in place.
pub fn init() {
    INIT.call_once(|| {
        #[cfg(feature = "web")]
        init_web_logging();
        #[cfg(not(feature = "web"))]
        init_native_logging();
    });
}

#[cfg(not(feature = "web"))]
fn init_native_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(feature = "web")]
fn init_web_logging() {
    use tracing_subscriber::{fmt::format::Pretty, prelude::*};
    use tracing_web::{MakeWebConsoleWriter, performance_layer};

    use crate::storage::{BrowserStorage, KeyValueStore, StorageType};

    console_error_panic_hook::set_once();

    let level = BrowserStorage::new(StorageType::Local)
        .get(WEB_LOG_LEVEL_KEY)
        .and_then(|value| parse_level(&value))
        .unwrap_or(LevelFilter::WARN);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time() // WASM doesn't have std::time
        .with_writer(MakeWebConsoleWriter::new());
    let perf_layer = performance_layer().with_details_from_fields(Pretty::default());

    let _ = tracing_subscriber::registry()
        .with(level)
        .with(fmt_layer)
        .with(perf_layer)
        .try_init();
}

/// Parse a level name as stored by the browser override.
pub fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::OFF),
        "error" => Some(LevelFilter::ERROR),
        "warn" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        _ => None,
    }
}
