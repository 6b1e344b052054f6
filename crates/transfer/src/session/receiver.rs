use std::sync::{Arc, OnceLock};

use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, watch};
use tokio::time::timeout;
use uuid::Uuid;

use bunkmate_protocol::models::TransferRole;
use bunkmate_protocol::{AppError, AppResult};

use super::{ProgressReporter, SessionControl, SessionHandle, wait_for_stop};
use crate::errors::{connection_error, invalid_address_error, io_to_error};
use crate::receiver::{ReceivedPayload, ReceiverMachine};
use crate::{TransferEventSink, TransferSettings, TransferTaskSpawner};

#[derive(Debug, Clone, PartialEq)]
pub enum ReceiveOutcome {
    Received(ReceivedPayload),
    Stopped,
}

pub type ReceiveHandle = SessionHandle<ReceiveOutcome>;

fn ipv4_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)(?:\.(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)){3}$",
            )
            .ok()
        })
        .as_ref()
}

/// Dotted-quad IPv4 check, without leading zeros or surrounding whitespace.
pub fn is_valid_ipv4(address: &str) -> bool {
    ipv4_pattern().is_some_and(|pattern| pattern.is_match(address))
}

/// One-shot client that pulls a timetable from a listening peer.
#[derive(Clone)]
pub struct TransferReceiver {
    event_sink: Arc<dyn TransferEventSink>,
    task_spawner: Arc<dyn TransferTaskSpawner>,
    settings: TransferSettings,
}

struct ReceiverContext {
    settings: TransferSettings,
    reporter: ProgressReporter,
}

impl ReceiverContext {
    fn report(&self, machine: &ReceiverMachine) {
        self.reporter.emit(
            machine.state().as_str(),
            machine.received_bytes(),
            machine.expected_bytes(),
            machine.progress(),
        );
    }
}

impl TransferReceiver {
    pub fn new(
        event_sink: Arc<dyn TransferEventSink>,
        task_spawner: Arc<dyn TransferTaskSpawner>,
        settings: TransferSettings,
    ) -> Self {
        Self {
            event_sink,
            task_spawner,
            settings: settings.normalized(),
        }
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    /// Validates `address` and starts the session in the background.
    pub fn start_receiving(&self, address: &str, port: u16) -> AppResult<ReceiveHandle> {
        let address = address.trim();
        if !is_valid_ipv4(address) {
            return Err(invalid_address_error(address));
        }

        let session_id = Uuid::new_v4().to_string();
        let mut reporter = ProgressReporter::new(
            self.event_sink.clone(),
            session_id.clone(),
            TransferRole::Receiver,
        );
        reporter.set_peer_address(format!("{address}:{port}"));
        let context = ReceiverContext {
            settings: self.settings.clone(),
            reporter,
        };

        let (control, stop_rx) = SessionControl::new();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let target = address.to_string();
        let task = self.task_spawner.spawn(
            "transfer_receiver_session",
            Box::pin(async move {
                let outcome = run_receiver_session(target, port, context, stop_rx).await;
                let _ = outcome_tx.send(outcome);
            }),
        )?;

        Ok(SessionHandle::new(session_id, control, outcome_rx, task))
    }

    pub async fn receive(&self, address: &str, port: u16) -> AppResult<ReceiveOutcome> {
        self.start_receiving(address, port)?.wait().await
    }
}

async fn run_receiver_session(
    address: String,
    port: u16,
    context: ReceiverContext,
    mut stop_rx: watch::Receiver<bool>,
) -> AppResult<ReceiveOutcome> {
    let mut machine = ReceiverMachine::new();
    machine.on_connecting();
    context.report(&machine);
    tracing::info!(
        event = "transfer_receiver_connecting",
        session_id = context.reporter.session_id(),
        address = address.as_str(),
        port
    );

    let connect_timeout_ms = context.settings.connect_timeout_ms;
    let connect = timeout(
        context.settings.connect_timeout(),
        TcpStream::connect((address.as_str(), port)),
    );
    let connected = tokio::select! {
        _ = wait_for_stop(&mut stop_rx) => None,
        connected = connect => Some(connected),
    };
    let mut stream = match connected {
        None => return Ok(finish_stopped(&mut machine, &context)),
        Some(Err(_)) => {
            let error = connection_error("Could not reach the other device in time")
                .with_context("timeoutMs", connect_timeout_ms.to_string());
            return Err(finish_failed(&mut machine, &context, error));
        }
        Some(Ok(Err(error))) => {
            return Err(finish_failed(&mut machine, &context, io_to_error(error)));
        }
        Some(Ok(Ok(stream))) => stream,
    };

    machine.on_connected();
    context.report(&machine);

    let exchanged = tokio::select! {
        _ = wait_for_stop(&mut stop_rx) => None,
        result = exchange(&mut machine, &mut stream, &context) => Some(result),
    };
    let _ = stream.shutdown().await;

    match exchanged {
        None => Ok(finish_stopped(&mut machine, &context)),
        Some(Ok(payload)) => {
            context.reporter.emit("complete", payload.byte_length, payload.byte_length, 1.0);
            tracing::info!(
                event = "transfer_receiver_completed",
                session_id = context.reporter.session_id(),
                byte_length = payload.byte_length
            );
            Ok(ReceiveOutcome::Received(payload))
        }
        Some(Err(error)) => Err(finish_failed(&mut machine, &context, error)),
    }
}

async fn exchange(
    machine: &mut ReceiverMachine,
    stream: &mut TcpStream,
    context: &ReceiverContext,
) -> AppResult<ReceivedPayload> {
    let request = machine.request_payload();
    stream.write_all(&request).await.map_err(io_to_error)?;
    context.report(machine);

    let mut buffer = vec![0_u8; context.settings.read_buffer_bytes as usize];
    loop {
        let read = stream.read(&mut buffer).await.map_err(io_to_error)?;
        if read == 0 {
            return Err(machine
                .on_closed()
                .unwrap_or_else(|| connection_error("The other device disconnected")));
        }

        let update = machine.on_data(&buffer[..read])?;
        if let Some(reply) = update.reply {
            stream.write_all(&reply).await.map_err(io_to_error)?;
            tracing::debug!(
                event = "transfer_receiver_header_acknowledged",
                session_id = context.reporter.session_id(),
                expected_bytes = machine.expected_bytes()
            );
        }
        if update.progress.is_some() {
            context.report(machine);
        }
        if update.complete {
            break;
        }
    }

    machine.finish()
}

fn finish_stopped(machine: &mut ReceiverMachine, context: &ReceiverContext) -> ReceiveOutcome {
    machine.stop();
    context.report(machine);
    tracing::info!(
        event = "transfer_receiver_stopped",
        session_id = context.reporter.session_id()
    );
    ReceiveOutcome::Stopped
}

fn finish_failed(
    machine: &mut ReceiverMachine,
    context: &ReceiverContext,
    error: AppError,
) -> AppError {
    machine.fail(error.clone());
    context.report(machine);
    tracing::warn!(
        event = "transfer_receiver_failed",
        session_id = context.reporter.session_id(),
        code = error.code.as_str(),
        error = error.to_string()
    );
    error.with_context("sessionId", context.reporter.session_id().to_string())
}
