pub mod attendance;
pub mod runtime;

pub use bunkmate_protocol::{AppError, AppResult, ResultExt};
