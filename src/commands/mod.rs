pub mod attendance;
pub mod catalog;
pub mod data;
pub mod transfer;

use std::future::Future;
use std::time::Instant;

use bunkmate_protocol::InvokeError;

pub(crate) fn normalize_request_id(request_id: Option<String>) -> String {
    request_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

pub(crate) fn command_start(command: &str, request_id: &str) -> Instant {
    tracing::info!(
        event = "command_start",
        command = command,
        request_id = request_id
    );
    Instant::now()
}

pub(crate) fn command_end_ok(command: &str, request_id: &str, started_at: Instant) {
    let duration_ms = started_at.elapsed().as_millis() as u64;
    tracing::info!(
        event = "command_end",
        command = command,
        request_id = request_id,
        ok = true,
        duration_ms = duration_ms
    );
}

pub(crate) fn command_end_error<E>(command: &str, request_id: &str, started_at: Instant, error: &E)
where
    E: Clone + Into<InvokeError>,
{
    let error: InvokeError = error.clone().into().with_request_id(request_id.to_string());
    let duration_ms = started_at.elapsed().as_millis() as u64;
    let primary_cause = error.causes.first().cloned().unwrap_or_default();

    tracing::error!(
        event = "command_end",
        command = command,
        request_id = request_id,
        ok = false,
        duration_ms = duration_ms,
        error_code = error.code.as_str(),
        error_message = error.message.as_str(),
        error_primary_cause = primary_cause.as_str(),
        error_context_count = error.context.len()
    );
}

pub(crate) fn run_command_sync<T, E, F>(
    command: &str,
    request_id: Option<String>,
    op: F,
) -> Result<T, InvokeError>
where
    E: Clone + Into<InvokeError>,
    F: FnOnce() -> Result<T, E>,
{
    let request_id = normalize_request_id(request_id);
    let started_at = command_start(command, &request_id);
    let result = op();
    finish(command, &request_id, started_at, result)
}

pub(crate) async fn run_command_async<T, E, Fut, F>(
    command: &str,
    request_id: Option<String>,
    op: F,
) -> Result<T, InvokeError>
where
    E: Clone + Into<InvokeError>,
    Fut: Future<Output = Result<T, E>>,
    F: FnOnce() -> Fut,
{
    let request_id = normalize_request_id(request_id);
    let started_at = command_start(command, &request_id);
    let result = op().await;
    finish(command, &request_id, started_at, result)
}

fn finish<T, E>(
    command: &str,
    request_id: &str,
    started_at: Instant,
    result: Result<T, E>,
) -> Result<T, InvokeError>
where
    E: Clone + Into<InvokeError>,
{
    match &result {
        Ok(_) => command_end_ok(command, request_id, started_at),
        Err(error) => command_end_error(command, request_id, started_at, error),
    }
    result.map_err(|error| error.into().with_request_id(request_id.to_string()))
}

#[cfg(test)]
#[path = "../../tests/commands/commands_tests.rs"]
mod tests;
