//! Receiver role as a plain state machine; sockets live in `session::receiver`.

use bunkmate_protocol::{AppError, AppResult};

use crate::codec::{
    ACK_HEADER_TOKEN, HeaderDecode, MAX_CONTROL_LINE_BYTES, REQUEST_DATA_TOKEN, decode_header,
    encode_token, peer_error_message,
};
use crate::errors::{connection_error, payload_decode_error, peer_reported_error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Idle,
    Connecting,
    Connected,
    AwaitingHeader,
    Receiving,
    Complete,
    Failed,
}

impl ReceiverState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::AwaitingHeader => "awaiting_header",
            Self::Receiving => "receiving",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// What the driver should do after feeding one read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiverUpdate {
    pub reply: Option<Vec<u8>>,
    pub progress: Option<f64>,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedPayload {
    pub byte_length: usize,
    pub text: String,
    pub value: serde_json::Value,
}

#[derive(Debug)]
pub struct ReceiverMachine {
    state: ReceiverState,
    header_buffer: Vec<u8>,
    payload: Vec<u8>,
    expected_bytes: usize,
    failure: Option<AppError>,
}

impl Default for ReceiverMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiverMachine {
    pub fn new() -> Self {
        Self {
            state: ReceiverState::Idle,
            header_buffer: Vec::new(),
            payload: Vec::new(),
            expected_bytes: 0,
            failure: None,
        }
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    pub fn failure(&self) -> Option<&AppError> {
        self.failure.as_ref()
    }

    pub fn expected_bytes(&self) -> usize {
        self.expected_bytes
    }

    pub fn received_bytes(&self) -> usize {
        self.payload.len()
    }

    pub fn progress(&self) -> f64 {
        match self.state {
            ReceiverState::Complete => 1.0,
            ReceiverState::Receiving if self.expected_bytes > 0 => {
                (self.payload.len() as f64 / self.expected_bytes as f64).min(1.0)
            }
            _ => 0.0,
        }
    }

    pub fn on_connecting(&mut self) {
        if self.state == ReceiverState::Idle {
            self.state = ReceiverState::Connecting;
        }
    }

    pub fn on_connected(&mut self) {
        if self.state == ReceiverState::Connecting {
            self.state = ReceiverState::Connected;
        }
    }

    /// Returns the request line to send and starts waiting for the header.
    pub fn request_payload(&mut self) -> Vec<u8> {
        self.header_buffer.clear();
        self.payload.clear();
        self.expected_bytes = 0;
        self.state = ReceiverState::AwaitingHeader;
        encode_token(REQUEST_DATA_TOKEN)
    }

    pub fn on_data(&mut self, bytes: &[u8]) -> AppResult<ReceiverUpdate> {
        match self.state {
            ReceiverState::AwaitingHeader => self.on_header_bytes(bytes),
            ReceiverState::Receiving => {
                if self.payload.is_empty()
                    && let Some(message) = peer_error_message(bytes)
                {
                    return Err(self.record(peer_reported_error(&message)));
                }
                self.append_payload(bytes);
                Ok(ReceiverUpdate {
                    reply: None,
                    progress: Some(self.progress()),
                    complete: self.state == ReceiverState::Complete,
                })
            }
            _ => Ok(ReceiverUpdate::default()),
        }
    }

    fn on_header_bytes(&mut self, bytes: &[u8]) -> AppResult<ReceiverUpdate> {
        let scan_from = self.header_buffer.len();
        self.header_buffer.extend_from_slice(bytes);
        let terminated = self.header_buffer[scan_from..].contains(&b'\n');
        if !terminated && self.header_buffer.len() < MAX_CONTROL_LINE_BYTES {
            return Ok(ReceiverUpdate::default());
        }

        let decoded = match decode_header(&self.header_buffer) {
            Ok(decoded) => decoded,
            Err(error) => return Err(self.record(error)),
        };

        match decoded {
            HeaderDecode::NeedMoreData => Ok(ReceiverUpdate::default()),
            HeaderDecode::PeerError { message } => Err(self.record(peer_reported_error(&message))),
            HeaderDecode::Header {
                byte_length,
                remainder,
            } => {
                self.header_buffer = Vec::new();
                self.expected_bytes = byte_length;
                self.payload = Vec::with_capacity(byte_length);
                self.state = ReceiverState::Receiving;
                self.append_payload(&remainder);
                Ok(ReceiverUpdate {
                    reply: Some(encode_token(ACK_HEADER_TOKEN)),
                    progress: Some(self.progress()),
                    complete: self.state == ReceiverState::Complete,
                })
            }
        }
    }

    fn append_payload(&mut self, bytes: &[u8]) {
        self.payload.extend_from_slice(bytes);
        if self.payload.len() >= self.expected_bytes {
            self.payload.truncate(self.expected_bytes);
            self.state = ReceiverState::Complete;
        }
    }

    /// Peer hung up. Returns the error unless the payload was already complete.
    pub fn on_closed(&mut self) -> Option<AppError> {
        if self.state.is_terminal() || self.state == ReceiverState::Idle {
            return None;
        }
        let error = connection_error("The connection closed before the timetable was received")
            .with_context("state", self.state.as_str())
            .with_context("receivedBytes", self.payload.len().to_string())
            .with_context("expectedBytes", self.expected_bytes.to_string());
        Some(self.record(error))
    }

    /// Decodes the completed payload as UTF-8 JSON.
    pub fn finish(&mut self) -> AppResult<ReceivedPayload> {
        if self.state != ReceiverState::Complete {
            let error = connection_error("The timetable transfer did not complete")
                .with_context("state", self.state.as_str());
            return Err(self.record(error));
        }

        let bytes = std::mem::take(&mut self.payload);
        let actual = bytes.len();
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(error) => {
                return Err(self.record_after_complete(payload_decode_error(
                    self.expected_bytes,
                    actual,
                    error.to_string(),
                )));
            }
        };
        let value = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => value,
            Err(error) => {
                return Err(self.record_after_complete(payload_decode_error(
                    self.expected_bytes,
                    actual,
                    error.to_string(),
                )));
            }
        };

        Ok(ReceivedPayload {
            byte_length: actual,
            text,
            value,
        })
    }

    pub fn fail(&mut self, error: AppError) {
        let _ = self.record(error);
    }

    fn record(&mut self, error: AppError) -> AppError {
        if !self.state.is_terminal() {
            self.state = ReceiverState::Failed;
            self.failure = Some(error.clone());
        }
        error
    }

    fn record_after_complete(&mut self, error: AppError) -> AppError {
        self.state = ReceiverState::Failed;
        self.failure = Some(error.clone());
        error
    }

    /// Back to `Idle`; repeated calls are no-ops.
    pub fn stop(&mut self) {
        self.state = ReceiverState::Idle;
        self.header_buffer.clear();
        self.payload.clear();
        self.expected_bytes = 0;
        self.failure = None;
    }
}

#[cfg(test)]
#[path = "../tests/transfer/receiver_tests.rs"]
mod tests;
