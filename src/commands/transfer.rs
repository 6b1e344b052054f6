use bunkmate_protocol::models::{ReceiveResultDto, ShareSessionDto};
use bunkmate_protocol::{AppResult, InvokeError};
use bunkmate_transfer::TransferSettings;

use super::{run_command_async, run_command_sync};
use crate::app::state::AppState;

pub fn transfer_get_settings(
    state: &AppState,
    request_id: Option<String>,
) -> Result<TransferSettings, InvokeError> {
    run_command_sync("transfer_get_settings", request_id, || {
        AppResult::Ok(state.transfer.settings().clone())
    })
}

/// Starts listening for one peer. `port` defaults to the configured transfer port.
pub async fn transfer_start_sharing(
    state: &AppState,
    port: Option<u16>,
    request_id: Option<String>,
) -> Result<ShareSessionDto, InvokeError> {
    run_command_async("transfer_start_sharing", request_id, || async move {
        state.transfer.start_sharing(port).await
    })
    .await
}

pub fn transfer_get_sharing(
    state: &AppState,
    request_id: Option<String>,
) -> Result<Option<ShareSessionDto>, InvokeError> {
    run_command_sync("transfer_get_sharing", request_id, || {
        AppResult::Ok(state.transfer.sharing_session())
    })
}

pub async fn transfer_stop_sharing(
    state: &AppState,
    request_id: Option<String>,
) -> Result<bool, InvokeError> {
    run_command_async("transfer_stop_sharing", request_id, || async move {
        AppResult::Ok(state.transfer.stop_sharing().await)
    })
    .await
}

pub async fn transfer_receive(
    state: &AppState,
    address: String,
    port: Option<u16>,
    request_id: Option<String>,
) -> Result<ReceiveResultDto, InvokeError> {
    run_command_async("transfer_receive", request_id, || async move {
        state.transfer.receive_timetable(&address, port).await
    })
    .await
}

pub fn transfer_stop_receiving(
    state: &AppState,
    request_id: Option<String>,
) -> Result<bool, InvokeError> {
    run_command_sync("transfer_stop_receiving", request_id, || {
        AppResult::Ok(state.transfer.stop_receiving())
    })
}
