//! Line-oriented wire format shared by both transfer roles.
//!
//! Control messages are short ASCII lines; the payload itself is raw bytes
//! whose length is announced up front by `HEADER:<n>\n`.

use bunkmate_protocol::AppResult;

use crate::errors::frame_error;

pub const REQUEST_DATA_TOKEN: &str = "REQUEST_DATA";
pub const ACK_HEADER_TOKEN: &str = "ACK_HEADER";
pub const MAX_PAYLOAD_BYTES: usize = 16 * 1024 * 1024;
/// Longest `HEADER:`/`ERROR:` line accepted, terminator included.
pub const MAX_CONTROL_LINE_BYTES: usize = 1024;

const HEADER_PREFIX: &str = "HEADER:";
const ERROR_PREFIX: &str = "ERROR:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderDecode {
    /// No line terminator yet; nothing was consumed.
    NeedMoreData,
    Header {
        byte_length: usize,
        remainder: Vec<u8>,
    },
    PeerError {
        message: String,
    },
}

pub fn encode_header(byte_length: usize) -> Vec<u8> {
    format!("{HEADER_PREFIX}{byte_length}\n").into_bytes()
}

pub fn encode_error(message: &str) -> Vec<u8> {
    let single_line = message.replace(['\r', '\n'], " ");
    format!("{ERROR_PREFIX}{single_line}\n").into_bytes()
}

pub fn encode_token(token: &str) -> Vec<u8> {
    token.as_bytes().to_vec()
}

/// Only the first `MAX_CONTROL_LINE_BYTES` are searched for the terminator;
/// a longer unterminated line is a frame error.
pub fn decode_header(buffer: &[u8]) -> AppResult<HeaderDecode> {
    let scan_len = buffer.len().min(MAX_CONTROL_LINE_BYTES);
    let Some(terminator) = buffer[..scan_len].iter().position(|byte| *byte == b'\n') else {
        if buffer.len() >= MAX_CONTROL_LINE_BYTES {
            return Err(frame_error(format!(
                "control line exceeds {MAX_CONTROL_LINE_BYTES} bytes without a terminator"
            )));
        }
        return Ok(HeaderDecode::NeedMoreData);
    };

    let mut line = &buffer[..terminator];
    if let Some(stripped) = line.strip_suffix(b"\r") {
        line = stripped;
    }
    let line = std::str::from_utf8(line)
        .map_err(|error| frame_error(format!("header line is not UTF-8: {error}")))?;

    if let Some(message) = line.strip_prefix(ERROR_PREFIX) {
        return Ok(HeaderDecode::PeerError {
            message: message.trim().to_string(),
        });
    }

    let Some(length_text) = line.strip_prefix(HEADER_PREFIX) else {
        return Err(frame_error(format!("unexpected control line: {line}")));
    };
    let byte_length = length_text
        .trim()
        .parse::<usize>()
        .map_err(|error| frame_error(format!("invalid header length {length_text:?}: {error}")))?;
    if byte_length > MAX_PAYLOAD_BYTES {
        return Err(frame_error(format!(
            "declared length {byte_length} exceeds {MAX_PAYLOAD_BYTES}"
        )));
    }

    Ok(HeaderDecode::Header {
        byte_length,
        remainder: buffer[terminator + 1..].to_vec(),
    })
}

/// Handshake tokens compare after trimming surrounding whitespace.
pub fn is_token(bytes: &[u8], token: &str) -> bool {
    bytes.trim_ascii() == token.as_bytes()
}

/// True while `bytes` could still grow into `token`.
pub fn is_token_prefix(bytes: &[u8], token: &str) -> bool {
    let trimmed = bytes.trim_ascii_start();
    trimmed.len() < token.len() && token.as_bytes().starts_with(trimmed)
}

/// Message of an `ERROR:` line at the start of `bytes`, if there is one.
pub fn peer_error_message(bytes: &[u8]) -> Option<String> {
    let rest = bytes.strip_prefix(ERROR_PREFIX.as_bytes())?;
    let end = rest
        .iter()
        .position(|byte| *byte == b'\n')
        .unwrap_or(rest.len());
    Some(String::from_utf8_lossy(&rest[..end]).trim().to_string())
}

#[cfg(test)]
#[path = "../tests/transfer/codec_tests.rs"]
mod tests;
