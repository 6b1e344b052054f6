use crate::{AppError, AppResult};

/// Runs synchronous work (filesystem, JSON over large buffers) off the async
/// worker threads and folds join failures into `AppError`.
pub async fn run_blocking<T, F>(label: &'static str, job: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result,
        Err(error) => Err(join_error_to_app_error(label, &error)),
    }
}

fn join_error_to_app_error(label: &'static str, error: &tokio::task::JoinError) -> AppError {
    let (code, message) = if error.is_cancelled() {
        ("blocking_task_canceled", "Background task was canceled")
    } else if error.is_panic() {
        ("blocking_task_panicked", "Background task panicked")
    } else {
        ("blocking_task_failed", "Background task failed")
    };

    let detail = format!("{error:?}");
    let detail = if detail.trim().is_empty() {
        "join error".to_string()
    } else {
        detail
    };

    AppError::new(code, message)
        .with_context("blockingTask", label)
        .with_context("joinError", detail)
}

#[cfg(test)]
#[path = "../../tests/runtime/blocking_tests.rs"]
mod tests;
