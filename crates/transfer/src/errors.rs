use bunkmate_protocol::AppError;
use std::io;

pub const TRANSFER_BIND_FAILED: &str = "transfer_bind_failed";
pub const TRANSFER_INVALID_ADDRESS: &str = "transfer_invalid_address";
pub const TRANSFER_CONNECTION_ERROR: &str = "transfer_connection_error";
pub const TRANSFER_FRAME_ERROR: &str = "transfer_frame_error";
pub const TRANSFER_NO_DATA: &str = "transfer_no_data";
pub const TRANSFER_PEER_REPORTED_ERROR: &str = "transfer_peer_reported_error";
pub const TRANSFER_TIMEOUT: &str = "transfer_timeout";
pub const TRANSFER_PAYLOAD_DECODE_FAILED: &str = "transfer_payload_decode_failed";
pub const TRANSFER_RUNTIME_UNAVAILABLE: &str = "transfer_runtime_unavailable";
pub const TRANSFER_TASK_ABORTED: &str = "transfer_task_aborted";

pub(crate) fn bind_error(address: &str, error: io::Error) -> AppError {
    AppError::new(TRANSFER_BIND_FAILED, "Could not open the sharing port")
        .with_context("bindAddress", address.to_string())
        .with_source(error)
}

pub(crate) fn invalid_address_error(address: &str) -> AppError {
    AppError::new(
        TRANSFER_INVALID_ADDRESS,
        "Enter a valid IPv4 address, for example 192.168.1.10",
    )
    .with_context("address", address.to_string())
}

pub(crate) fn connection_error(message: impl Into<String>) -> AppError {
    AppError::new(TRANSFER_CONNECTION_ERROR, message)
}

pub(crate) fn io_to_error(error: io::Error) -> AppError {
    let message = match error.kind() {
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::BrokenPipe => "The connection was closed by the other device",
        io::ErrorKind::ConnectionRefused => "The other device refused the connection",
        _ => "Transfer connection failed",
    };
    connection_error(message).with_source(error)
}

pub(crate) fn frame_error(message: impl Into<String>) -> AppError {
    AppError::new(TRANSFER_FRAME_ERROR, "Received a malformed transfer header").with_cause(message)
}

pub(crate) fn no_data_error() -> AppError {
    AppError::new(TRANSFER_NO_DATA, "There is no timetable saved on this device to share")
}

pub(crate) fn peer_reported_error(message: &str) -> AppError {
    AppError::new(TRANSFER_PEER_REPORTED_ERROR, "The other device reported an error")
        .with_context("peerMessage", message.to_string())
        .with_cause(message.to_string())
}

pub(crate) fn timeout_error(phase: &str, timeout_ms: u64) -> AppError {
    AppError::new(TRANSFER_TIMEOUT, "The transfer stalled and was stopped")
        .with_context("phase", phase.to_string())
        .with_context("timeoutMs", timeout_ms.to_string())
}

pub(crate) fn payload_decode_error(expected: usize, actual: usize, cause: String) -> AppError {
    AppError::new(
        TRANSFER_PAYLOAD_DECODE_FAILED,
        "The received timetable could not be read",
    )
    .with_context("expectedBytes", expected.to_string())
    .with_context("actualBytes", actual.to_string())
    .with_cause(cause)
}
