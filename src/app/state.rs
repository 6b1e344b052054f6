use std::path::{Path, PathBuf};
use std::sync::Arc;

use bunkmate_core::{NoopReminderScheduler, ReminderScheduler, TimetableRepository};
use bunkmate_db::KeyValueStore;
use bunkmate_transfer::{
    NoopTransferEventSink, TokioTransferTaskSpawner, TransferEventSink, TransferReceiver,
    TransferSender, TransferSettings, TransferTaskSpawner,
};

use super::transfer_service::TransferService;

/// Capabilities the embedding platform provides.
#[derive(Clone)]
pub struct HostServices {
    pub event_sink: Arc<dyn TransferEventSink>,
    pub reminder_scheduler: Arc<dyn ReminderScheduler>,
    pub task_spawner: Arc<dyn TransferTaskSpawner>,
    pub transfer_settings: TransferSettings,
}

impl Default for HostServices {
    fn default() -> Self {
        Self {
            event_sink: Arc::new(NoopTransferEventSink),
            reminder_scheduler: Arc::new(NoopReminderScheduler),
            task_spawner: Arc::new(TokioTransferTaskSpawner),
            transfer_settings: TransferSettings::default(),
        }
    }
}

pub struct AppState {
    pub repository: TimetableRepository,
    pub transfer: TransferService,
    pub reminders: Arc<dyn ReminderScheduler>,
    log_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(store: Arc<dyn KeyValueStore>, host: HostServices) -> Self {
        let repository = TimetableRepository::new(store.clone());
        let sender = TransferSender::new(
            store,
            host.event_sink.clone(),
            host.task_spawner.clone(),
            host.transfer_settings.clone(),
        );
        let receiver = TransferReceiver::new(
            host.event_sink,
            host.task_spawner,
            host.transfer_settings,
        );
        let transfer = TransferService::new(
            sender,
            receiver,
            repository.clone(),
            host.reminder_scheduler.clone(),
        );

        Self {
            repository,
            transfer,
            reminders: host.reminder_scheduler,
            log_dir: None,
        }
    }

    pub(crate) fn with_log_dir(mut self, log_dir: PathBuf) -> Self {
        self.log_dir = Some(log_dir);
        self
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}
