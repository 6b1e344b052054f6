use std::sync::{Arc, Mutex};
use std::time::Duration;

use bunkmate_db::{KeyValueStore, MemoryKeyValueStore, TIMETABLE_KEY};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::receiver::{ReceiveOutcome, TransferReceiver, is_valid_ipv4};
use super::sender::{BUSY_MESSAGE, SendOutcome, TransferSender};
use crate::{
    NoopTransferEventSink, NoopTransferTaskSpawner, TokioTransferTaskSpawner, TransferEventSink,
    TransferSettings,
};
use bunkmate_protocol::AppResult;
use bunkmate_protocol::models::TransferProgressSnapshotDto;

#[derive(Default)]
struct RecordingSink {
    snapshots: Mutex<Vec<TransferProgressSnapshotDto>>,
}

impl RecordingSink {
    fn states(&self) -> Vec<String> {
        self.snapshots
            .lock()
            .expect("snapshots lock")
            .iter()
            .map(|snapshot| snapshot.state.clone())
            .collect()
    }

    fn progress_values(&self) -> Vec<f64> {
        self.snapshots
            .lock()
            .expect("snapshots lock")
            .iter()
            .map(|snapshot| snapshot.progress)
            .collect()
    }
}

impl TransferEventSink for RecordingSink {
    fn emit_progress(&self, snapshot: &TransferProgressSnapshotDto) -> AppResult<()> {
        self.snapshots
            .lock()
            .expect("snapshots lock")
            .push(snapshot.clone());
        Ok(())
    }
}

fn test_settings() -> TransferSettings {
    TransferSettings {
        chunk_size_bytes: 512,
        stall_timeout_ms: 1_000,
        connect_timeout_ms: 1_000,
        ..TransferSettings::default()
    }
}

fn sender_with(store: Arc<dyn KeyValueStore>, sink: Arc<dyn TransferEventSink>) -> TransferSender {
    TransferSender::new(
        store,
        sink,
        Arc::new(TokioTransferTaskSpawner),
        test_settings(),
    )
}

fn receiver_with(sink: Arc<dyn TransferEventSink>) -> TransferReceiver {
    TransferReceiver::new(sink, Arc::new(TokioTransferTaskSpawner), test_settings())
}

fn sample_timetable_json() -> String {
    let subjects = (0..40)
        .map(|index| {
            format!(
                r#"{{"id":"s{index}","name":"Mathematics {index}","startTime":"09:00","endTime":"10:00","attendedClasses":3,"totalClasses":4}}"#
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!(r#"{{"days":[{{"name":"Monday","subjects":[{subjects}]}}]}}"#)
}

async fn read_to_end_with_timeout(stream: &mut TcpStream) -> Vec<u8> {
    let mut received = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut received))
        .await
        .expect("read should finish")
        .expect("read to end");
    received
}

#[tokio::test]
async fn sender_and_receiver_should_transfer_stored_timetable() {
    let payload = sample_timetable_json();
    let store = Arc::new(MemoryKeyValueStore::with_entries([(TIMETABLE_KEY, payload.clone())]));
    let sender_sink = Arc::new(RecordingSink::default());
    let receiver_sink = Arc::new(RecordingSink::default());

    let handle = sender_with(store, sender_sink.clone())
        .start_listening("127.0.0.1", 0)
        .await
        .expect("start listening");
    let port = handle.local_addr().port();

    let outcome = receiver_with(receiver_sink.clone())
        .receive("127.0.0.1", port)
        .await
        .expect("receive timetable");
    let ReceiveOutcome::Received(received) = outcome else {
        panic!("receiver should complete");
    };
    assert_eq!(received.text, payload);
    assert_eq!(received.byte_length, payload.len());

    let sent = handle.wait().await.expect("sender should finish");
    assert_eq!(
        sent,
        SendOutcome::Completed {
            bytes_sent: payload.len()
        }
    );

    let sender_states = sender_sink.states();
    assert!(sender_states.contains(&"listening".to_string()));
    assert!(sender_states.contains(&"streaming".to_string()));
    assert_eq!(sender_states.last().map(String::as_str), Some("done"));

    let progress = sender_sink.progress_values();
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(progress.last().copied(), Some(1.0));

    let receiver_progress = receiver_sink.progress_values();
    assert!(receiver_progress.iter().all(|value| *value <= 1.0));
    assert_eq!(
        receiver_sink.states().last().map(String::as_str),
        Some("complete")
    );
}

#[tokio::test]
async fn sender_without_timetable_should_reply_error_and_terminate() {
    let store = Arc::new(MemoryKeyValueStore::new());
    let handle = sender_with(store, Arc::new(NoopTransferEventSink))
        .start_listening("127.0.0.1", 0)
        .await
        .expect("start listening");

    let mut client = TcpStream::connect(handle.local_addr())
        .await
        .expect("connect");
    client.write_all(b"REQUEST_DATA").await.expect("request");
    let reply = read_to_end_with_timeout(&mut client).await;
    assert_eq!(reply, b"ERROR:No timetable data to send.\n".to_vec());

    let error = handle.wait().await.expect_err("sender should fail");
    assert_eq!(error.code, "transfer_no_data");
}

#[tokio::test]
async fn receiver_should_surface_sender_no_data_error() {
    let store = Arc::new(MemoryKeyValueStore::new());
    let handle = sender_with(store, Arc::new(NoopTransferEventSink))
        .start_listening("127.0.0.1", 0)
        .await
        .expect("start listening");

    let error = receiver_with(Arc::new(NoopTransferEventSink))
        .receive("127.0.0.1", handle.local_addr().port())
        .await
        .expect_err("receiver should fail");
    assert_eq!(error.code, "transfer_peer_reported_error");
    assert_eq!(
        error.context_value("peerMessage"),
        Some("No timetable data to send.")
    );
    let _ = handle.wait().await;
}

#[tokio::test]
async fn receiver_should_fail_when_sender_closes_early() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let fake_sender = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut request = [0_u8; 12];
        stream.read_exact(&mut request).await.expect("request");
        assert_eq!(&request, b"REQUEST_DATA");
        stream.write_all(b"HEADER:1000\n").await.expect("header");
        let mut ack = [0_u8; 10];
        stream.read_exact(&mut ack).await.expect("ack");
        assert_eq!(&ack, b"ACK_HEADER");
        stream.write_all(&[b' '; 400]).await.expect("partial payload");
    });

    let sink = Arc::new(RecordingSink::default());
    let error = receiver_with(sink.clone())
        .receive("127.0.0.1", port)
        .await
        .expect_err("receiver should fail");
    fake_sender.await.expect("fake sender");

    assert_eq!(error.code, "transfer_connection_error");
    assert_eq!(error.context_value("receivedBytes"), Some("400"));
    assert_eq!(error.context_value("expectedBytes"), Some("1000"));
    let states = sink.states();
    assert_eq!(states.last().map(String::as_str), Some("failed"));
    assert!(!states.contains(&"complete".to_string()));
}

#[tokio::test]
async fn receiver_should_reject_invalid_address_without_connecting() {
    let receiver = receiver_with(Arc::new(NoopTransferEventSink));
    for address in ["", "256.1.1.1", "192.168.1", "localhost", "01.2.3.4", "1.2.3.4.5"] {
        let error = receiver
            .start_receiving(address, 38466)
            .err()
            .expect("invalid address should fail");
        assert_eq!(error.code, "transfer_invalid_address");
    }
}

#[test]
fn is_valid_ipv4_should_accept_dotted_quads() {
    assert!(is_valid_ipv4("192.168.1.10"));
    assert!(is_valid_ipv4("0.0.0.0"));
    assert!(is_valid_ipv4("255.255.255.255"));
    assert!(!is_valid_ipv4(" 10.0.0.1"));
    assert!(!is_valid_ipv4("10.0.0.256"));
}

#[tokio::test]
async fn sender_should_reject_second_connection_while_busy() {
    let store = Arc::new(MemoryKeyValueStore::with_entries([(TIMETABLE_KEY, "{\"days\":[]}")]));
    let handle = sender_with(store, Arc::new(NoopTransferEventSink))
        .start_listening("127.0.0.1", 0)
        .await
        .expect("start listening");

    let _first = TcpStream::connect(handle.local_addr())
        .await
        .expect("first connect");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut second = TcpStream::connect(handle.local_addr())
        .await
        .expect("second connect");
    let reply = read_to_end_with_timeout(&mut second).await;
    assert_eq!(reply, format!("ERROR:{BUSY_MESSAGE}\n").into_bytes());

    handle.stop();
    assert_eq!(handle.wait().await.expect("stopped"), SendOutcome::Stopped);
}

#[tokio::test]
async fn sender_should_time_out_when_ack_never_arrives() {
    let store = Arc::new(MemoryKeyValueStore::with_entries([(TIMETABLE_KEY, "{\"days\":[]}")]));
    let handle = sender_with(store, Arc::new(NoopTransferEventSink))
        .start_listening("127.0.0.1", 0)
        .await
        .expect("start listening");

    let mut client = TcpStream::connect(handle.local_addr())
        .await
        .expect("connect");
    client.write_all(b"REQUEST_DATA").await.expect("request");

    let error = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("watchdog should fire")
        .expect_err("sender should time out");
    assert_eq!(error.code, "transfer_timeout");
    assert_eq!(error.context_value("phase"), Some("awaiting_ack"));
}

#[tokio::test]
async fn sender_stop_should_release_port_and_be_idempotent() {
    let store = Arc::new(MemoryKeyValueStore::new());
    let sink = Arc::new(RecordingSink::default());
    let handle = sender_with(store.clone(), sink.clone())
        .start_listening("127.0.0.1", 0)
        .await
        .expect("start listening");
    let port = handle.local_addr().port();

    handle.stop();
    handle.stop();
    assert!(handle.is_stopped());
    assert_eq!(handle.wait().await.expect("stopped"), SendOutcome::Stopped);
    assert_eq!(sink.states().last().map(String::as_str), Some("idle"));

    let rebound = sender_with(store, Arc::new(NoopTransferEventSink))
        .start_listening("127.0.0.1", port)
        .await
        .expect("port should be free again");
    rebound.stop();
    let _ = rebound.wait().await;
}

#[tokio::test]
async fn sender_should_report_bind_error_for_taken_port() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = occupied.local_addr().expect("local addr").port();

    let error = sender_with(Arc::new(MemoryKeyValueStore::new()), Arc::new(NoopTransferEventSink))
        .start_listening("127.0.0.1", port)
        .await
        .err()
        .expect("bind should fail");
    assert_eq!(error.code, "transfer_bind_failed");
}

#[tokio::test]
async fn receiver_stop_should_end_session_waiting_for_header() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let silent_peer = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(stream);
    });

    let handle = receiver_with(Arc::new(NoopTransferEventSink))
        .start_receiving("127.0.0.1", port)
        .expect("start receiving");
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.stop();
    handle.stop();

    assert_eq!(handle.wait().await.expect("stopped"), ReceiveOutcome::Stopped);
    silent_peer.await.expect("silent peer");
}

#[tokio::test]
async fn detached_stopper_should_stop_session_while_caller_waits() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    let silent_peer = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(stream);
    });

    let handle = receiver_with(Arc::new(NoopTransferEventSink))
        .start_receiving("127.0.0.1", port)
        .expect("start receiving");
    let stopper = handle.stopper();
    assert_eq!(stopper.session_id(), handle.session_id());

    let waiter = tokio::spawn(handle.wait());
    tokio::time::sleep(Duration::from_millis(50)).await;
    stopper.stop();
    assert!(stopper.is_stopped());

    let outcome = waiter.await.expect("join waiter").expect("stopped");
    assert_eq!(outcome, ReceiveOutcome::Stopped);
    silent_peer.await.expect("silent peer");
}

#[tokio::test]
async fn start_listening_should_fail_without_task_runtime() {
    let sender = TransferSender::new(
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(NoopTransferEventSink),
        Arc::new(NoopTransferTaskSpawner),
        test_settings(),
    );
    let error = sender
        .start_listening("127.0.0.1", 0)
        .await
        .err()
        .expect("spawn should fail");
    assert_eq!(error.code, "transfer_runtime_unavailable");
}
