use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use bunkmate_db::LibsqlKeyValueStore;
use bunkmate_kernel::runtime::blocking::run_blocking;
use bunkmate_protocol::{AppResult, ResultExt};

use crate::app::state::{AppState, HostServices};

pub const DB_FILE_NAME: &str = "bunkmate.db";

pub(crate) fn log_warn_fallback(message: &str) {
    if tracing::dispatcher::has_been_set() {
        tracing::warn!(event = "bootstrap_warning", message = message);
        return;
    }

    eprintln!("{message}");
}

/// Initializes logging and storage under `app_data_dir` and wires the app state.
///
/// Logging failures are reported but do not prevent startup.
pub async fn setup(app_data_dir: &Path, host: HostServices) -> AppResult<AppState> {
    tokio::fs::create_dir_all(app_data_dir)
        .await
        .with_context(|| format!("failed to create app data dir: {}", app_data_dir.display()))
        .with_code(
            "app_data_dir_create_failed",
            "Could not create the app data directory",
        )
        .with_ctx("appDataDir", app_data_dir.display().to_string())?;

    let logging_dir = app_data_dir.to_path_buf();
    let log_dir = match run_blocking("init_logging", move || {
        bunkmate_logging::init_logging(&logging_dir)
    })
    .await
    {
        Ok(guard) => Some(guard.log_dir().to_path_buf()),
        Err(error) => {
            log_warn_fallback(&format!("logging init failed: {error}"));
            None
        }
    };

    let db_path = app_data_dir.join(DB_FILE_NAME);
    let store = LibsqlKeyValueStore::open(&db_path).await?;
    tracing::info!(event = "storage_opened", db_path = %db_path.display());

    let state = AppState::new(Arc::new(store), host);
    Ok(match log_dir {
        Some(log_dir) => state.with_log_dir(log_dir),
        None => state,
    })
}

#[cfg(test)]
#[path = "../../tests/bootstrap/setup_tests.rs"]
mod tests;
