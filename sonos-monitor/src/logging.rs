//! Logging setup for monitor binaries
//!
//! The library only emits `tracing` events. Applications that want them on
//! stderr call [`init_logging`] once at startup.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// How much to log, and how
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// Install nothing; events are dropped
    Silent,
    /// Compact lines at `info`
    Development,
    /// Pretty multi-line output at `debug` with source locations
    Debug,
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid log filter {filter:?}: {reason}")]
    InvalidFilter { filter: String, reason: String },
}

/// Install a global subscriber for `mode`.
///
/// `SONOS_MONITOR_LOG` (then `RUST_LOG`) overrides the mode's default level
/// with any `EnvFilter` directive, e.g. `sonos_monitor=trace,warp=warn`.
/// Fails if a global subscriber is already installed.
///
/// ```rust,no_run
/// use sonos_monitor::logging::{init_logging, LoggingMode};
///
/// init_logging(LoggingMode::Development).expect("logging already initialized");
/// ```
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => Registry::default()
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .compact(),
            )
            .with(create_env_filter("info")?)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
        LoggingMode::Debug => Registry::default()
            .with(
                fmt::layer()
                    .pretty()
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(create_env_filter("debug")?)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
    }
}

/// Pick the mode from `SONOS_MONITOR_LOG_MODE` (`silent`, `development`,
/// `debug`), defaulting to development.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_logging(mode_from(std::env::var("SONOS_MONITOR_LOG_MODE").ok().as_deref()))
}

fn mode_from(value: Option<&str>) -> LoggingMode {
    match value.map(str::trim) {
        Some("silent") => LoggingMode::Silent,
        Some("debug") => LoggingMode::Debug,
        _ => LoggingMode::Development,
    }
}

fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var("SONOS_MONITOR_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());

    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter {
        filter: directives,
        reason: e.to_string(),
    })
}

/// Whether a global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}
