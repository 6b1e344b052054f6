use std::sync::{Arc, Mutex, MutexGuard};

use bunkmate_core::{ReminderScheduler, TimetableRepository, reschedule_reminders};
use bunkmate_protocol::AppResult;
use bunkmate_protocol::models::{ReceiveResultDto, ReceiveStatus, ShareSessionDto};
use bunkmate_transfer::{
    ListenHandle, ReceiveOutcome, SendOutcome, SessionStopper, TransferReceiver, TransferSender,
    TransferSettings,
};

const SHARE_BIND_ADDRESS: &str = "0.0.0.0";

fn lock_slot<'a, T>(slot: &'a Mutex<T>, name: &'static str) -> MutexGuard<'a, T> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(event = "transfer_slot_lock_poisoned", slot = name);
            poisoned.into_inner()
        }
    }
}

/// Owns at most one share session and one receive session at a time.
///
/// Starting a new session of either role stops the previous one first.
pub struct TransferService {
    sender: TransferSender,
    receiver: TransferReceiver,
    repository: TimetableRepository,
    reminders: Arc<dyn ReminderScheduler>,
    sharing: Mutex<Option<ListenHandle>>,
    receiving: Mutex<Option<SessionStopper>>,
}

impl TransferService {
    pub fn new(
        sender: TransferSender,
        receiver: TransferReceiver,
        repository: TimetableRepository,
        reminders: Arc<dyn ReminderScheduler>,
    ) -> Self {
        Self {
            sender,
            receiver,
            repository,
            reminders,
            sharing: Mutex::new(None),
            receiving: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &TransferSettings {
        self.sender.settings()
    }

    pub async fn start_sharing(&self, port: Option<u16>) -> AppResult<ShareSessionDto> {
        self.stop_sharing().await;

        let port = port.unwrap_or(self.settings().port);
        let handle = self.sender.start_listening(SHARE_BIND_ADDRESS, port).await?;
        let local_addr = handle.local_addr();
        let dto = ShareSessionDto {
            session_id: handle.session_id().to_string(),
            local_address: local_addr.ip().to_string(),
            port: local_addr.port(),
        };

        let replaced = lock_slot(&self.sharing, "sharing").replace(handle);
        if let Some(previous) = replaced {
            previous.stop();
        }
        Ok(dto)
    }

    /// The current share session, if it is still listening or streaming.
    pub fn sharing_session(&self) -> Option<ShareSessionDto> {
        let slot = lock_slot(&self.sharing, "sharing");
        slot.as_ref()
            .filter(|handle| !handle.is_finished() && !handle.is_stopped())
            .map(|handle| ShareSessionDto {
                session_id: handle.session_id().to_string(),
                local_address: handle.local_addr().ip().to_string(),
                port: handle.local_addr().port(),
            })
    }

    /// Stops the share session and waits until its listener is released.
    /// Returns whether a session was still running.
    pub async fn stop_sharing(&self) -> bool {
        let Some(handle) = lock_slot(&self.sharing, "sharing").take() else {
            return false;
        };

        let was_running = !handle.is_finished();
        handle.stop();
        let session_id = handle.session_id().to_string();
        match handle.wait().await {
            Ok(SendOutcome::Completed { bytes_sent }) => {
                tracing::info!(event = "share_session_finished", session_id, bytes_sent);
            }
            Ok(SendOutcome::Stopped) => {
                tracing::info!(event = "share_session_stopped", session_id);
            }
            Err(error) => {
                tracing::warn!(
                    event = "share_session_failed",
                    session_id,
                    error_code = error.code.as_str(),
                    error = %error
                );
            }
        }
        was_running
    }

    /// Pulls a timetable from `address`, persists it and reschedules class reminders.
    ///
    /// Reminder failures are logged and reported through `reminder_count`; the
    /// received timetable stays saved.
    pub async fn receive_timetable(
        &self,
        address: &str,
        port: Option<u16>,
    ) -> AppResult<ReceiveResultDto> {
        let port = port.unwrap_or(self.receiver.settings().port);
        let handle = self.receiver.start_receiving(address, port)?;
        let session_id = handle.session_id().to_string();
        let replaced = lock_slot(&self.receiving, "receiving").replace(handle.stopper());
        if let Some(previous) = replaced {
            previous.stop();
        }

        let outcome = handle.wait().await;
        {
            let mut slot = lock_slot(&self.receiving, "receiving");
            if slot
                .as_ref()
                .is_some_and(|stopper| stopper.session_id() == session_id)
            {
                slot.take();
            }
        }

        let payload = match outcome? {
            ReceiveOutcome::Received(payload) => payload,
            ReceiveOutcome::Stopped => {
                return Ok(ReceiveResultDto {
                    session_id,
                    status: ReceiveStatus::Stopped,
                    summary: None,
                    reminder_count: None,
                });
            }
        };

        let summary = self
            .repository
            .apply_received_value(&payload.value)
            .await
            .map_err(|error| error.with_context("sessionId", session_id.clone()))?;
        let reminder_count = self.reschedule_after_receive(&session_id).await;

        Ok(ReceiveResultDto {
            session_id,
            status: ReceiveStatus::Received,
            summary: Some(summary),
            reminder_count,
        })
    }

    pub fn stop_receiving(&self) -> bool {
        match lock_slot(&self.receiving, "receiving").take() {
            Some(stopper) => {
                stopper.stop();
                true
            }
            None => false,
        }
    }

    async fn reschedule_after_receive(&self, session_id: &str) -> Option<usize> {
        let result = match self.repository.load_timetable().await {
            Ok(timetable) => {
                reschedule_reminders(self.reminders.as_ref(), &timetable.unwrap_or_default())
                    .await
            }
            Err(error) => Err(error),
        };

        match result {
            Ok(count) => Some(count),
            Err(error) => {
                tracing::warn!(
                    event = "received_reminders_reschedule_failed",
                    session_id,
                    error_code = error.code.as_str(),
                    error = %error
                );
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/app/transfer_service_tests.rs"]
mod tests;
