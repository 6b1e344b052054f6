pub mod codec;
pub mod errors;
mod event_sink;
pub mod receiver;
pub mod sender;
mod session;
pub mod settings;
mod task_spawner;

pub use event_sink::{NoopTransferEventSink, TransferEventSink};
pub use receiver::{ReceivedPayload, ReceiverMachine, ReceiverState};
pub use sender::{SenderMachine, SenderState};
pub use session::receiver::{ReceiveHandle, ReceiveOutcome, TransferReceiver, is_valid_ipv4};
pub use session::sender::{ListenHandle, SendOutcome, TransferSender};
pub use session::{SessionHandle, SessionStopper};
pub use settings::{DEFAULT_TRANSFER_PORT, TransferSettings};
pub use task_spawner::{
    NoopTransferTaskSpawner, TokioTransferTaskSpawner, TransferTask, TransferTaskSpawner,
};

pub use bunkmate_protocol::{AppError, AppResult, ResultExt};
