use crate::{AppError, ResultExt};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder as RollingBuilder, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[path = "config.rs"]
mod config;
#[path = "retention.rs"]
mod retention;

pub use retention::cleanup_expired_logs;

pub const DEFAULT_KEEP_DAYS: u64 = 7;
pub const LOG_DIR_NAME: &str = "logs";
pub const LOG_FILE_PREFIX: &str = "bunkmate";

#[derive(Debug, Clone)]
pub struct LoggingGuard {
    log_dir: PathBuf,
    level: String,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn level(&self) -> &str {
        &self.level
    }
}

fn worker_guard_slot() -> &'static Mutex<Option<WorkerGuard>> {
    static SLOT: OnceLock<Mutex<Option<WorkerGuard>>> = OnceLock::new();
    SLOT.get_or_init(|| Mutex::new(None))
}

fn keep_worker_guard(slot: &Mutex<Option<WorkerGuard>>, guard: WorkerGuard) {
    let mut slot = match slot.lock() {
        Ok(slot) => slot,
        Err(poisoned) => {
            eprintln!("log worker guard slot was poisoned, recovering");
            poisoned.into_inner()
        }
    };
    *slot = Some(guard);
}

/// Level from `BUNKMATE_LOG_LEVEL`, falling back to `debug` in debug builds and `info` otherwise.
pub fn resolve_log_level() -> String {
    config::resolve_log_level()
}

/// Installs the global subscriber: daily-rolled JSON files under `<app_data_dir>/logs`,
/// plus a compact stderr layer in debug builds.
///
/// Expired files are removed first. When a global subscriber already exists the
/// file writer is still prepared but no subscriber is installed.
pub fn init_logging(app_data_dir: &Path) -> Result<LoggingGuard, AppError> {
    let log_dir = app_data_dir.join(LOG_DIR_NAME);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))
        .with_code("log_dir_create_failed", "Could not create the log directory")
        .with_ctx("logDir", log_dir.display().to_string())?;
    cleanup_expired_logs(&log_dir, DEFAULT_KEEP_DAYS)?;

    let file_appender = RollingBuilder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(&log_dir)
        .with_context(|| format!("failed to create log writer: {}", log_dir.display()))
        .with_code("log_appender_create_failed", "Could not create the log writer")
        .with_ctx("logDir", log_dir.display().to_string())?;
    let (file_writer, worker_guard) = tracing_appender::non_blocking(file_appender);

    let level = resolve_log_level();
    if tracing::dispatcher::has_been_set() {
        return Ok(LoggingGuard { log_dir, level });
    }

    keep_worker_guard(worker_guard_slot(), worker_guard);

    let env_filter = EnvFilter::new(level.clone());
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_current_span(false)
        .with_span_list(false);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);
    #[cfg(debug_assertions)]
    let subscriber = subscriber.with(
        tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(true)
            .with_target(true),
    );

    subscriber
        .try_init()
        .with_context(|| format!("failed to install log subscriber: level={level}"))
        .with_code(
            "log_subscriber_init_failed",
            "Could not initialize logging",
        )
        .with_ctx("logLevel", level.clone())?;

    tracing::info!(
        event = "logging_initialized",
        log_dir = %log_dir.display(),
        level = %level
    );
    Ok(LoggingGuard { log_dir, level })
}

#[cfg(test)]
#[path = "../tests/logging/logging_tests.rs"]
mod tests;
