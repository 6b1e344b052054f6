mod errors;
pub mod models;

pub use errors::{AppError, AppErrorPayload, AppResult, ErrorContextItem, InvokeError, ResultExt};
