use bunkmate_protocol::{AppResult, InvokeError};

use super::run_command_async;
use crate::app::state::AppState;

/// Stops any running transfer, cancels reminders and removes all stored user data.
pub async fn app_reset_data(
    state: &AppState,
    request_id: Option<String>,
) -> Result<(), InvokeError> {
    run_command_async("app_reset_data", request_id, || async move {
        state.transfer.stop_receiving();
        state.transfer.stop_sharing().await;
        state.reminders.cancel_all().await?;
        state.repository.reset_all().await?;
        AppResult::Ok(())
    })
    .await
}
