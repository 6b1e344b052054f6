//! Sender role as a plain state machine; sockets live in `session::sender`.

use bunkmate_protocol::AppError;

use crate::codec::{
    ACK_HEADER_TOKEN, REQUEST_DATA_TOKEN, encode_error, encode_header, is_token, is_token_prefix,
};
use crate::errors::{connection_error, no_data_error, timeout_error};

pub const NO_DATA_MESSAGE: &str = "No timetable data to send.";
const MAX_CONTROL_BUFFER_BYTES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Idle,
    ListenSetup,
    Listening,
    PeerConnected,
    AwaitingRequest,
    HeaderSent,
    Streaming,
    Done,
    Failed,
}

impl SenderState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ListenSetup => "listen_setup",
            Self::Listening => "listening",
            Self::PeerConnected => "peer_connected",
            Self::AwaitingRequest => "awaiting_request",
            Self::HeaderSent => "header_sent",
            Self::Streaming => "streaming",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlInput {
    /// The expected token arrived.
    Matched,
    /// A partial token is buffered.
    Pending,
    /// Input did not match and was dropped.
    Ignored,
}

#[derive(Debug, Clone)]
pub enum PayloadReply {
    Header(Vec<u8>),
    Refuse { line: Vec<u8>, error: AppError },
}

#[derive(Debug)]
pub struct SenderMachine {
    state: SenderState,
    control: Vec<u8>,
    payload: Vec<u8>,
    bytes_sent: usize,
    chunk_size: usize,
    failure: Option<AppError>,
}

impl SenderMachine {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            state: SenderState::Idle,
            control: Vec::new(),
            payload: Vec::new(),
            bytes_sent: 0,
            chunk_size: chunk_size.max(1),
            failure: None,
        }
    }

    pub fn state(&self) -> SenderState {
        self.state
    }

    pub fn failure(&self) -> Option<&AppError> {
        self.failure.as_ref()
    }

    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    pub fn total_bytes(&self) -> usize {
        self.payload.len()
    }

    pub fn progress(&self) -> f64 {
        if self.payload.is_empty() {
            return 0.0;
        }
        self.bytes_sent as f64 / self.payload.len() as f64
    }

    pub fn begin_listen(&mut self) {
        if self.state == SenderState::Idle {
            self.state = SenderState::ListenSetup;
        }
    }

    pub fn on_bound(&mut self) {
        if self.state == SenderState::ListenSetup {
            self.state = SenderState::Listening;
        }
    }

    pub fn on_peer_connected(&mut self) {
        if self.state == SenderState::Listening {
            self.state = SenderState::PeerConnected;
            self.control.clear();
        }
    }

    /// Feeds bytes read from the peer outside of streaming.
    pub fn on_data(&mut self, bytes: &[u8]) -> ControlInput {
        if self.state == SenderState::PeerConnected {
            self.state = SenderState::AwaitingRequest;
        }
        let token = match self.state {
            SenderState::AwaitingRequest => REQUEST_DATA_TOKEN,
            SenderState::HeaderSent => ACK_HEADER_TOKEN,
            _ => return ControlInput::Ignored,
        };

        self.control.extend_from_slice(bytes);
        if is_token(&self.control, token) {
            self.control.clear();
            if self.state == SenderState::HeaderSent {
                self.state = SenderState::Streaming;
            }
            return ControlInput::Matched;
        }
        if is_token_prefix(&self.control, token) && self.control.len() <= MAX_CONTROL_BUFFER_BYTES
        {
            return ControlInput::Pending;
        }

        self.control.clear();
        ControlInput::Ignored
    }

    /// Answers a matched request with the stored payload, or refuses when there is none.
    pub fn on_payload(&mut self, payload: Option<String>) -> PayloadReply {
        match payload.filter(|value| !value.is_empty()) {
            Some(payload) => {
                self.payload = payload.into_bytes();
                self.bytes_sent = 0;
                self.state = SenderState::HeaderSent;
                PayloadReply::Header(encode_header(self.payload.len()))
            }
            None => {
                let error = no_data_error();
                self.fail(error.clone());
                PayloadReply::Refuse {
                    line: encode_error(NO_DATA_MESSAGE),
                    error,
                }
            }
        }
    }

    /// Next chunk to write, without advancing.
    pub fn next_chunk(&self) -> Option<&[u8]> {
        if self.state != SenderState::Streaming || self.bytes_sent >= self.payload.len() {
            return None;
        }
        let end = (self.bytes_sent + self.chunk_size).min(self.payload.len());
        Some(&self.payload[self.bytes_sent..end])
    }

    /// Records a fully written chunk and returns the new progress.
    pub fn on_chunk_written(&mut self, written: usize) -> f64 {
        if self.state != SenderState::Streaming {
            return self.progress();
        }
        self.bytes_sent = (self.bytes_sent + written).min(self.payload.len());
        if self.bytes_sent == self.payload.len() {
            self.state = SenderState::Done;
            return 1.0;
        }
        self.progress()
    }

    pub fn on_stall(&mut self, phase: &str, timeout_ms: u64) -> AppError {
        let error = timeout_error(phase, timeout_ms)
            .with_context("bytesSent", self.bytes_sent.to_string())
            .with_context("totalBytes", self.payload.len().to_string());
        self.fail(error.clone());
        error
    }

    /// Peer hung up. Returns the error unless the transfer had already finished.
    pub fn on_closed(&mut self) -> Option<AppError> {
        if self.state.is_terminal() || self.state == SenderState::Idle {
            return None;
        }
        let error = connection_error("The other device disconnected before the transfer finished")
            .with_context("state", self.state.as_str())
            .with_context("bytesSent", self.bytes_sent.to_string())
            .with_context("totalBytes", self.payload.len().to_string());
        self.fail(error.clone());
        Some(error)
    }

    pub fn fail(&mut self, error: AppError) {
        if self.state.is_terminal() {
            return;
        }
        self.state = SenderState::Failed;
        self.failure = Some(error);
    }

    /// Back to `Idle`; repeated calls are no-ops.
    pub fn stop(&mut self) {
        self.state = SenderState::Idle;
        self.control.clear();
        self.payload.clear();
        self.bytes_sent = 0;
        self.failure = None;
    }
}

#[cfg(test)]
#[path = "../tests/transfer/sender_tests.rs"]
mod tests;
