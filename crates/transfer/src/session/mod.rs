use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use bunkmate_protocol::models::{TransferProgressSnapshotDto, TransferRole};
use bunkmate_protocol::{AppError, AppResult};

use crate::TransferEventSink;
use crate::errors::TRANSFER_TASK_ABORTED;

pub mod receiver;
pub mod sender;

#[derive(Clone)]
pub(crate) struct SessionControl {
    stop_tx: Arc<watch::Sender<bool>>,
    stopped: Arc<AtomicBool>,
}

impl SessionControl {
    pub(crate) fn new() -> (Self, watch::Receiver<bool>) {
        let (stop_tx, stop_rx) = watch::channel(false);
        (
            Self {
                stop_tx: Arc::new(stop_tx),
                stopped: Arc::new(AtomicBool::new(false)),
            },
            stop_rx,
        )
    }

    /// Signals the session task once. Later calls return `false`.
    pub(crate) fn stop(&self) -> bool {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return false;
        }
        let _ = self.stop_tx.send(true);
        true
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Resolves once a stop was requested; never resolves if the handle is gone.
pub(crate) async fn wait_for_stop(stop_rx: &mut watch::Receiver<bool>) {
    if *stop_rx.borrow_and_update() {
        return;
    }
    while stop_rx.changed().await.is_ok() {
        if *stop_rx.borrow_and_update() {
            return;
        }
    }
    std::future::pending::<()>().await;
}

pub(crate) struct ProgressReporter {
    event_sink: Arc<dyn TransferEventSink>,
    session_id: String,
    role: TransferRole,
    peer_address: Option<String>,
}

impl ProgressReporter {
    pub(crate) fn new(
        event_sink: Arc<dyn TransferEventSink>,
        session_id: String,
        role: TransferRole,
    ) -> Self {
        Self {
            event_sink,
            session_id,
            role,
            peer_address: None,
        }
    }

    pub(crate) fn session_id(&self) -> &str {
        self.session_id.as_str()
    }

    pub(crate) fn set_peer_address(&mut self, peer_address: impl Into<String>) {
        self.peer_address = Some(peer_address.into());
    }

    pub(crate) fn emit(&self, state: &str, transferred: usize, total: usize, progress: f64) {
        let snapshot = TransferProgressSnapshotDto {
            session_id: self.session_id.clone(),
            role: self.role,
            state: state.to_string(),
            transferred_bytes: transferred as u64,
            total_bytes: total as u64,
            progress,
            peer_address: self.peer_address.clone(),
        };
        if let Err(error) = self.event_sink.emit_progress(&snapshot) {
            tracing::warn!(
                event = "transfer_event_emit_failed",
                event_name = "transfer_progress",
                role = self.role.as_str(),
                error = error.to_string()
            );
        }
    }
}

/// Cloneable stop switch detached from the handle, for callers that also `wait`.
#[derive(Clone)]
pub struct SessionStopper {
    session_id: String,
    control: SessionControl,
}

impl SessionStopper {
    pub fn session_id(&self) -> &str {
        self.session_id.as_str()
    }

    pub fn stop(&self) {
        if self.control.stop() {
            tracing::info!(event = "transfer_stop_requested", session_id = %self.session_id);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.control.is_stopped()
    }
}

/// Handle to a running transfer session task.
pub struct SessionHandle<T> {
    session_id: String,
    control: SessionControl,
    outcome_rx: oneshot::Receiver<AppResult<T>>,
    task: JoinHandle<()>,
}

impl<T> SessionHandle<T> {
    pub(crate) fn new(
        session_id: String,
        control: SessionControl,
        outcome_rx: oneshot::Receiver<AppResult<T>>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            session_id,
            control,
            outcome_rx,
            task,
        }
    }

    pub fn session_id(&self) -> &str {
        self.session_id.as_str()
    }

    pub fn stopper(&self) -> SessionStopper {
        SessionStopper {
            session_id: self.session_id.clone(),
            control: self.control.clone(),
        }
    }

    /// Tears the session down from any state. Safe to call repeatedly.
    pub fn stop(&self) {
        self.stopper().stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.control.is_stopped()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> AppResult<T> {
        match self.outcome_rx.await {
            Ok(outcome) => outcome,
            Err(_) => {
                let error =
                    AppError::new(TRANSFER_TASK_ABORTED, "The transfer stopped unexpectedly")
                        .with_context("sessionId", self.session_id);
                match self.task.await {
                    Err(join_error) => Err(error.with_cause(join_error.to_string())),
                    Ok(()) => Err(error),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/transfer/session_tests.rs"]
mod tests;
