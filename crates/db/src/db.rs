use libsql::Connection;

pub const TIMETABLE_KEY: &str = "timetable";
pub const SUBJECTS_KEY: &str = "subjects";
pub const PERCENTAGE_KEY: &str = "percentage";

pub const USER_DATA_KEYS: [&str; 3] = [TIMETABLE_KEY, SUBJECTS_KEY, PERCENTAGE_KEY];

pub type DbConn = Connection;

#[path = "db_bootstrap.rs"]
mod db_bootstrap;
#[path = "db_settings_store.rs"]
mod db_settings_store;

pub use db_bootstrap::{init_db, open_db};
pub use db_settings_store::{
    delete_app_settings, get_app_setting, get_app_settings_batch, set_app_setting,
    set_app_settings_batch,
};
