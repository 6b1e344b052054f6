use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, watch};
use tokio::time::{sleep, timeout};
use uuid::Uuid;

use bunkmate_db::{KeyValueStore, TIMETABLE_KEY};
use bunkmate_protocol::AppResult;
use bunkmate_protocol::models::TransferRole;

use super::{ProgressReporter, SessionControl, SessionHandle, SessionStopper, wait_for_stop};
use crate::codec::encode_error;
use crate::errors::{bind_error, connection_error, io_to_error};
use crate::sender::{ControlInput, PayloadReply, SenderMachine};
use crate::{TransferEventSink, TransferSettings, TransferTaskSpawner};

pub const BUSY_MESSAGE: &str = "Another device is already receiving from this phone.";
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Completed { bytes_sent: usize },
    Stopped,
}

pub struct ListenHandle {
    local_addr: SocketAddr,
    session: SessionHandle<SendOutcome>,
}

impl ListenHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn session_id(&self) -> &str {
        self.session.session_id()
    }

    pub fn stop(&self) {
        self.session.stop();
    }

    pub fn stopper(&self) -> SessionStopper {
        self.session.stopper()
    }

    pub fn is_stopped(&self) -> bool {
        self.session.is_stopped()
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    pub async fn wait(self) -> AppResult<SendOutcome> {
        self.session.wait().await
    }
}

/// One-shot server that hands the stored timetable to the first peer that asks.
#[derive(Clone)]
pub struct TransferSender {
    store: Arc<dyn KeyValueStore>,
    event_sink: Arc<dyn TransferEventSink>,
    task_spawner: Arc<dyn TransferTaskSpawner>,
    settings: TransferSettings,
}

struct SenderContext {
    store: Arc<dyn KeyValueStore>,
    settings: TransferSettings,
    reporter: ProgressReporter,
}

impl SenderContext {
    fn report(&self, machine: &SenderMachine) {
        self.reporter.emit(
            machine.state().as_str(),
            machine.bytes_sent(),
            machine.total_bytes(),
            machine.progress(),
        );
    }
}

impl TransferSender {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        event_sink: Arc<dyn TransferEventSink>,
        task_spawner: Arc<dyn TransferTaskSpawner>,
        settings: TransferSettings,
    ) -> Self {
        Self {
            store,
            event_sink,
            task_spawner,
            settings: settings.normalized(),
        }
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    pub async fn start_listening(&self, bind_address: &str, port: u16) -> AppResult<ListenHandle> {
        let session_id = Uuid::new_v4().to_string();
        let context = SenderContext {
            store: self.store.clone(),
            settings: self.settings.clone(),
            reporter: ProgressReporter::new(
                self.event_sink.clone(),
                session_id.clone(),
                TransferRole::Sender,
            ),
        };
        let mut machine = SenderMachine::new(self.settings.chunk_size_bytes as usize);
        machine.begin_listen();

        let address = format!("{bind_address}:{port}");
        let bound = match TcpListener::bind(address.as_str()).await {
            Ok(listener) => listener.local_addr().map(|local_addr| (listener, local_addr)),
            Err(error) => Err(error),
        };
        let (listener, local_addr) = match bound {
            Ok(value) => value,
            Err(error) => {
                let error = bind_error(address.as_str(), error);
                tracing::warn!(
                    event = "transfer_sender_bind_failed",
                    session_id = %session_id,
                    bind_address = %address,
                    error = error.to_string()
                );
                machine.fail(error.clone());
                context.report(&machine);
                return Err(error);
            }
        };
        machine.on_bound();
        context.report(&machine);
        tracing::info!(
            event = "transfer_sender_listening",
            session_id = %session_id,
            local_addr = %local_addr
        );

        let (control, stop_rx) = SessionControl::new();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let task = self.task_spawner.spawn(
            "transfer_sender_session",
            Box::pin(async move {
                let outcome = run_sender_session(listener, machine, context, stop_rx).await;
                let _ = outcome_tx.send(outcome);
            }),
        )?;

        Ok(ListenHandle {
            local_addr,
            session: SessionHandle::new(session_id, control, outcome_rx, task),
        })
    }
}

async fn run_sender_session(
    listener: TcpListener,
    mut machine: SenderMachine,
    mut context: SenderContext,
    mut stop_rx: watch::Receiver<bool>,
) -> AppResult<SendOutcome> {
    let accepted = tokio::select! {
        _ = wait_for_stop(&mut stop_rx) => None,
        accepted = listener.accept() => Some(accepted),
    };
    let Some(accepted) = accepted else {
        return Ok(finish_stopped(&mut machine, &context));
    };
    let (mut stream, peer_addr) = match accepted {
        Ok(value) => value,
        Err(error) => return Err(finish_failed(&mut machine, &context, io_to_error(error))),
    };

    context.reporter.set_peer_address(peer_addr.to_string());
    machine.on_peer_connected();
    context.report(&machine);
    tracing::info!(
        event = "transfer_sender_peer_connected",
        session_id = context.reporter.session_id(),
        peer_addr = %peer_addr
    );

    let served = tokio::select! {
        _ = wait_for_stop(&mut stop_rx) => None,
        result = serve_peer(&mut machine, &mut stream, &context) => Some(result),
        never = reject_extra_peers(&listener, context.reporter.session_id()) => match never {},
    };
    drop(listener);
    let _ = stream.shutdown().await;

    match served {
        None => Ok(finish_stopped(&mut machine, &context)),
        Some(Ok(())) => {
            tracing::info!(
                event = "transfer_sender_completed",
                session_id = context.reporter.session_id(),
                bytes_sent = machine.bytes_sent()
            );
            Ok(SendOutcome::Completed {
                bytes_sent: machine.bytes_sent(),
            })
        }
        Some(Err(error)) => Err(finish_failed(&mut machine, &context, error)),
    }
}

async fn serve_peer(
    machine: &mut SenderMachine,
    stream: &mut TcpStream,
    context: &SenderContext,
) -> AppResult<()> {
    let mut buffer = vec![0_u8; context.settings.read_buffer_bytes as usize];

    loop {
        let read = stream.read(&mut buffer).await.map_err(io_to_error)?;
        if read == 0 {
            return Err(peer_closed(machine));
        }
        if machine.on_data(&buffer[..read]) == ControlInput::Matched {
            break;
        }
    }
    tracing::debug!(
        event = "transfer_sender_request_received",
        session_id = context.reporter.session_id()
    );

    let stored = context.store.get_string(TIMETABLE_KEY).await?;
    match machine.on_payload(stored) {
        PayloadReply::Refuse { line, error } => {
            if let Err(write_error) = stream.write_all(&line).await {
                tracing::warn!(
                    event = "transfer_sender_refusal_write_failed",
                    session_id = context.reporter.session_id(),
                    error = write_error.to_string()
                );
            }
            let _ = stream.flush().await;
            return Err(error);
        }
        PayloadReply::Header(header) => {
            stream.write_all(&header).await.map_err(io_to_error)?;
        }
    }
    context.report(machine);

    let stall_timeout = context.settings.stall_timeout();
    let stall_timeout_ms = context.settings.stall_timeout_ms;
    loop {
        let read = match timeout(stall_timeout, stream.read(&mut buffer)).await {
            Ok(read) => read.map_err(io_to_error)?,
            Err(_) => return Err(machine.on_stall("awaiting_ack", stall_timeout_ms)),
        };
        if read == 0 {
            return Err(peer_closed(machine));
        }
        if machine.on_data(&buffer[..read]) == ControlInput::Matched {
            break;
        }
    }
    context.report(machine);

    let pacing = context.settings.chunk_pacing();
    while let Some(chunk) = machine.next_chunk() {
        let written = chunk.len();
        match timeout(stall_timeout, stream.write_all(chunk)).await {
            Ok(result) => result.map_err(io_to_error)?,
            Err(_) => return Err(machine.on_stall("streaming", stall_timeout_ms)),
        }
        machine.on_chunk_written(written);
        context.report(machine);

        if pacing.is_zero() {
            tokio::task::yield_now().await;
        } else {
            sleep(pacing).await;
        }
    }

    stream.flush().await.map_err(io_to_error)?;
    Ok(())
}

fn peer_closed(machine: &mut SenderMachine) -> bunkmate_protocol::AppError {
    machine
        .on_closed()
        .unwrap_or_else(|| connection_error("The other device disconnected"))
}

/// Answers every further connection with a busy error while a peer is being served.
async fn reject_extra_peers(listener: &TcpListener, session_id: &str) -> Infallible {
    let busy_line = encode_error(BUSY_MESSAGE);
    loop {
        match listener.accept().await {
            Ok((mut stream, peer_addr)) => {
                tracing::info!(
                    event = "transfer_sender_extra_peer_rejected",
                    session_id,
                    peer_addr = %peer_addr
                );
                let _ = stream.write_all(&busy_line).await;
                let _ = stream.shutdown().await;
            }
            Err(error) => {
                tracing::warn!(
                    event = "transfer_sender_accept_failed",
                    session_id,
                    error = error.to_string()
                );
                sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}

fn finish_stopped(machine: &mut SenderMachine, context: &SenderContext) -> SendOutcome {
    machine.stop();
    context.report(machine);
    tracing::info!(
        event = "transfer_sender_stopped",
        session_id = context.reporter.session_id()
    );
    SendOutcome::Stopped
}

fn finish_failed(
    machine: &mut SenderMachine,
    context: &SenderContext,
    error: bunkmate_protocol::AppError,
) -> bunkmate_protocol::AppError {
    machine.fail(error.clone());
    context.report(machine);
    tracing::warn!(
        event = "transfer_sender_failed",
        session_id = context.reporter.session_id(),
        code = error.code.as_str(),
        error = error.to_string()
    );
    error.with_context("sessionId", context.reporter.session_id().to_string())
}
