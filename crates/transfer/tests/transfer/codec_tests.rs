use super::*;

#[test]
fn decode_header_should_return_length_and_remainder() {
    let mut buffer = encode_header(1234);
    buffer.extend_from_slice(b"{\"days\"");

    let decoded = decode_header(&buffer).expect("decode header");
    assert_eq!(
        decoded,
        HeaderDecode::Header {
            byte_length: 1234,
            remainder: b"{\"days\"".to_vec(),
        }
    );
}

#[test]
fn decode_header_should_wait_for_terminator() {
    assert_eq!(
        decode_header(b"HEADER:12").expect("partial header"),
        HeaderDecode::NeedMoreData
    );
    assert_eq!(decode_header(b"").expect("empty buffer"), HeaderDecode::NeedMoreData);
}

#[test]
fn decode_header_should_tolerate_carriage_return() {
    let decoded = decode_header(b"HEADER:42\r\n").expect("decode header");
    assert_eq!(
        decoded,
        HeaderDecode::Header {
            byte_length: 42,
            remainder: Vec::new(),
        }
    );
}

#[test]
fn decode_header_should_reject_unparsable_length() {
    let error = decode_header(b"HEADER:abc\n").expect_err("bad length");
    assert_eq!(error.code, "transfer_frame_error");

    let error = decode_header(b"HELLO\n").expect_err("unknown line");
    assert_eq!(error.code, "transfer_frame_error");
}

#[test]
fn decode_header_should_reject_oversized_length() {
    let header = encode_header(MAX_PAYLOAD_BYTES + 1);
    let error = decode_header(&header).expect_err("too large");
    assert_eq!(error.code, "transfer_frame_error");
}

#[test]
fn decode_header_should_surface_peer_error_line() {
    let line = encode_error("No timetable data to send.");
    assert_eq!(line, b"ERROR:No timetable data to send.\n".to_vec());

    let decoded = decode_header(&line).expect("decode error line");
    assert_eq!(
        decoded,
        HeaderDecode::PeerError {
            message: "No timetable data to send.".to_string(),
        }
    );
}

#[test]
fn encode_error_should_keep_message_on_one_line() {
    let line = encode_error("first\nsecond");
    assert_eq!(line, b"ERROR:first second\n".to_vec());
}

#[test]
fn is_token_should_compare_trimmed_bytes() {
    assert!(is_token(b"REQUEST_DATA", REQUEST_DATA_TOKEN));
    assert!(is_token(b"  ACK_HEADER\r\n", ACK_HEADER_TOKEN));
    assert!(!is_token(b"REQUEST", REQUEST_DATA_TOKEN));
    assert!(!is_token(b"REQUEST_DATA_EXTRA", REQUEST_DATA_TOKEN));
}

#[test]
fn is_token_prefix_should_only_accept_strict_prefixes() {
    assert!(is_token_prefix(b"REQ", REQUEST_DATA_TOKEN));
    assert!(is_token_prefix(b"", REQUEST_DATA_TOKEN));
    assert!(!is_token_prefix(b"REQUEST_DATA", REQUEST_DATA_TOKEN));
    assert!(!is_token_prefix(b"HELLO", REQUEST_DATA_TOKEN));
}

#[test]
fn peer_error_message_should_read_until_newline() {
    assert_eq!(
        peer_error_message(b"ERROR:busy\ntrailing").as_deref(),
        Some("busy")
    );
    assert_eq!(peer_error_message(b"{\"days\":[]}"), None);
}

#[test]
fn decode_header_should_reject_unterminated_line_at_limit() {
    let short = vec![b'7'; MAX_CONTROL_LINE_BYTES - 1];
    assert_eq!(
        decode_header(&short).expect("below limit"),
        HeaderDecode::NeedMoreData
    );

    let long = vec![b'7'; MAX_CONTROL_LINE_BYTES];
    let error = decode_header(&long).expect_err("at limit");
    assert_eq!(error.code, "transfer_frame_error");

    let mut late_newline = vec![b'7'; MAX_CONTROL_LINE_BYTES + 10];
    late_newline.push(b'\n');
    assert!(decode_header(&late_newline).is_err());
}
