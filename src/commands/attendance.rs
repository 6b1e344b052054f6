use bunkmate_core::{AttendanceEdit, reschedule_reminders};
use bunkmate_protocol::models::{Subject, SubjectAttendanceDto, Timetable};
use bunkmate_protocol::{AppResult, InvokeError};

use super::run_command_async;
use crate::app::state::AppState;

pub async fn timetable_get(
    state: &AppState,
    request_id: Option<String>,
) -> Result<Option<Timetable>, InvokeError> {
    run_command_async("timetable_get", request_id, || async move {
        state.repository.load_timetable().await
    })
    .await
}

/// Saves a locally edited timetable, merges new subject names into the catalog
/// and reschedules class reminders. Returns the names newly added to the catalog.
pub async fn timetable_save(
    state: &AppState,
    timetable: Timetable,
    request_id: Option<String>,
) -> Result<Vec<String>, InvokeError> {
    run_command_async("timetable_save", request_id, || async move {
        let added = state.repository.save_timetable(&timetable).await?;
        reschedule_reminders(state.reminders.as_ref(), &timetable).await?;
        AppResult::Ok(added)
    })
    .await
}

pub async fn attendance_edit(
    state: &AppState,
    day: String,
    subject_id: String,
    edit: AttendanceEdit,
    request_id: Option<String>,
) -> Result<Subject, InvokeError> {
    run_command_async("attendance_edit", request_id, || async move {
        state
            .repository
            .edit_attendance(&day, &subject_id, edit)
            .await
    })
    .await
}

pub async fn attendance_overview(
    state: &AppState,
    request_id: Option<String>,
) -> Result<Vec<SubjectAttendanceDto>, InvokeError> {
    run_command_async("attendance_overview", request_id, || async move {
        state.repository.subject_overview().await
    })
    .await
}

pub async fn attendance_get_criteria(
    state: &AppState,
    request_id: Option<String>,
) -> Result<u32, InvokeError> {
    run_command_async("attendance_get_criteria", request_id, || async move {
        state.repository.load_criteria().await
    })
    .await
}

pub async fn attendance_set_criteria(
    state: &AppState,
    percent: u32,
    request_id: Option<String>,
) -> Result<u32, InvokeError> {
    run_command_async("attendance_set_criteria", request_id, || async move {
        state.repository.save_criteria(percent).await?;
        AppResult::Ok(percent)
    })
    .await
}
