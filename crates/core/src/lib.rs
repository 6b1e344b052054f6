pub mod attendance;
pub mod catalog;
pub mod ingest;
pub mod reminders;
pub mod repository;

pub use attendance::{AttendanceEdit, apply_edit, subject_overview};
pub use catalog::{PALETTE, SubjectCatalog, icon_for_subject};
pub use ingest::{IngestOutcome, ingest, normalize};
pub use reminders::{
    NoopReminderScheduler, ReminderScheduler, build_class_reminders, reschedule_reminders,
};
pub use repository::{DEFAULT_CRITERIA_PERCENT, TimetableRepository};

pub use bunkmate_protocol::{AppError, AppResult, ResultExt, models};
