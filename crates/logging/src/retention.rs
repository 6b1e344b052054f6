use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::Context;

use crate::{AppError, ResultExt};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

pub(super) fn cleanup_expired_logs_with_duration(
    log_dir: &Path,
    keep_duration: Duration,
    now: SystemTime,
) -> Result<usize, AppError> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let entries = fs::read_dir(log_dir)
        .with_context(|| format!("failed to read log directory: {}", log_dir.display()))
        .with_code("log_cleanup_read_dir_failed", "Could not read the log directory")
        .with_ctx("logDir", log_dir.display().to_string())?;

    let mut removed = 0usize;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read log entry: {}", log_dir.display()))
            .with_code("log_cleanup_read_entry_failed", "Could not read a log entry")
            .with_ctx("logDir", log_dir.display().to_string())?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let modified_at = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .with_context(|| format!("failed to read log modification time: {}", path.display()))
            .with_code(
                "log_cleanup_metadata_failed",
                "Could not read log file metadata",
            )
            .with_ctx("logPath", path.display().to_string())?;

        let elapsed = now.duration_since(modified_at).unwrap_or_default();
        if elapsed <= keep_duration {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(error) => {
                tracing::warn!(
                    event = "log_cleanup_remove_failed",
                    log_path = %path.display(),
                    error = %error
                );
            }
        }
    }

    Ok(removed)
}

/// Deletes plain files in `log_dir` last modified more than `keep_days` ago.
pub fn cleanup_expired_logs(log_dir: &Path, keep_days: u64) -> Result<usize, AppError> {
    let keep_duration = Duration::from_secs(keep_days.saturating_mul(SECONDS_PER_DAY));
    cleanup_expired_logs_with_duration(log_dir, keep_duration, SystemTime::now())
}
