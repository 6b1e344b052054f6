mod app;
mod bootstrap;
pub mod commands;

pub use app::state::{AppState, HostServices};
pub use app::transfer_service::TransferService;
pub use bootstrap::setup::{DB_FILE_NAME, setup};

pub use bunkmate_protocol::{AppError, AppResult, InvokeError, models};
