pub mod db;
pub mod db_error;
pub mod store;

pub use db::*;
pub use db_error::{DbAppError, DbResult};
pub use store::{KeyValueStore, LibsqlKeyValueStore, MemoryKeyValueStore};

pub use bunkmate_protocol::{AppError, AppResult, ResultExt};
