use std::sync::Arc;

use bunkmate_core::AttendanceEdit;
use bunkmate_db::MemoryKeyValueStore;
use bunkmate_protocol::models::{AttendanceOutlookDto, Day, Subject, Timetable};
use bunkmate_protocol::{AppError, AppResult};

use super::*;
use crate::app::state::{AppState, HostServices};

fn memory_state() -> AppState {
    AppState::new(Arc::new(MemoryKeyValueStore::new()), HostServices::default())
}

fn slot(id: &str, name: &str, attended: u32, total: u32) -> Subject {
    Subject {
        id: id.to_string(),
        name: name.to_string(),
        professor: None,
        start_time: "09:00".to_string(),
        end_time: "10:00".to_string(),
        attended_classes: attended,
        total_classes: total,
    }
}

fn sample_timetable() -> Timetable {
    let mut timetable = Timetable::empty_week();
    if let Some(monday) = timetable.day_mut("Monday") {
        monday.subjects.push(slot("m1", "Algebra", 18, 20));
    }
    timetable.days.push(Day {
        name: "Extra".to_string(),
        subjects: vec![slot("x1", "Biology", 10, 20)],
    });
    timetable
}

#[test]
fn normalize_request_id_should_default_blank_values() {
    assert_eq!(normalize_request_id(None), "unknown");
    assert_eq!(normalize_request_id(Some("   ".to_string())), "unknown");
    assert_eq!(normalize_request_id(Some(" req-7 ".to_string())), "req-7");
}

#[test]
fn run_command_sync_should_attach_request_id_to_errors() {
    let result: Result<(), _> = run_command_sync("failing_command", Some("req-9".to_string()), || {
        AppResult::<()>::Err(AppError::new("example_failed", "Example failed"))
    });
    let error = result.expect_err("command should fail");
    assert_eq!(error.code, "example_failed");
    assert_eq!(error.request_id.as_deref(), Some("req-9"));
}

#[tokio::test]
async fn run_command_async_should_pass_through_success() {
    let value = run_command_async("answer", None, || async { AppResult::Ok(42) })
        .await
        .expect("command should succeed");
    assert_eq!(value, 42);
}

#[tokio::test]
async fn attendance_commands_should_round_trip_through_repository() {
    let state = memory_state();
    let added = attendance::timetable_save(&state, sample_timetable(), None)
        .await
        .expect("save timetable");
    assert_eq!(added, vec!["Algebra", "Biology"]);

    let subject = attendance::attendance_edit(
        &state,
        "monday".to_string(),
        "m1".to_string(),
        AttendanceEdit::MarkPresent,
        None,
    )
    .await
    .expect("edit attendance");
    assert_eq!((subject.attended_classes, subject.total_classes), (19, 21));

    let overview = attendance::attendance_overview(&state, None)
        .await
        .expect("overview");
    let biology = overview
        .iter()
        .find(|entry| entry.name == "Biology")
        .expect("biology overview");
    assert_eq!(biology.percentage, 50);
    assert!(!biology.meets_threshold);
    assert_eq!(biology.outlook, AttendanceOutlookDto::MustAttend(Some(20)));

    assert_eq!(
        attendance::attendance_get_criteria(&state, None)
            .await
            .expect("criteria"),
        75
    );
    let error = attendance::attendance_set_criteria(&state, 101, Some("req-c".to_string()))
        .await
        .expect_err("criteria above 100");
    assert_eq!(error.code, "attendance_criteria_invalid");
    assert_eq!(error.request_id.as_deref(), Some("req-c"));
    assert_eq!(
        attendance::attendance_set_criteria(&state, 60, None)
            .await
            .expect("set criteria"),
        60
    );
}

#[tokio::test]
async fn attendance_edit_should_fail_without_saved_timetable() {
    let state = memory_state();
    let error = attendance::attendance_edit(
        &state,
        "Monday".to_string(),
        "m1".to_string(),
        AttendanceEdit::MarkAbsent,
        None,
    )
    .await
    .expect_err("nothing saved");
    assert_eq!(error.code, "timetable_not_found");
}

#[tokio::test]
async fn catalog_commands_should_manage_topics() {
    let state = memory_state();
    attendance::timetable_save(&state, sample_timetable(), None)
        .await
        .expect("save timetable");

    let entries = catalog::catalog_list(&state, None).await.expect("list");
    let algebra_id = entries
        .iter()
        .find(|entry| entry.name == "Algebra")
        .map(|entry| entry.id.clone())
        .expect("algebra entry");

    let topic = catalog::catalog_add_topic(&state, algebra_id.clone(), "Matrices".to_string(), None)
        .await
        .expect("add topic");
    let updated = catalog::catalog_update_topic_notes(
        &state,
        algebra_id.clone(),
        topic.id.clone(),
        "rank and nullity".to_string(),
        None,
    )
    .await
    .expect("update notes");
    assert_eq!(updated.notes, "rank and nullity");

    let favorite =
        catalog::catalog_toggle_topic_favorite(&state, algebra_id.clone(), topic.id.clone(), None)
            .await
            .expect("toggle favorite");
    assert!(favorite.is_favorite);

    catalog::catalog_remove_topic(&state, algebra_id.clone(), topic.id.clone(), None)
        .await
        .expect("remove topic");
    let error = catalog::catalog_remove_topic(&state, algebra_id, topic.id, None)
        .await
        .expect_err("already removed");
    assert_eq!(error.code, "catalog_topic_not_found");
}

#[tokio::test]
async fn app_reset_data_should_clear_user_data() {
    let state = memory_state();
    attendance::timetable_save(&state, sample_timetable(), None)
        .await
        .expect("save timetable");
    attendance::attendance_set_criteria(&state, 90, None)
        .await
        .expect("set criteria");

    data::app_reset_data(&state, None).await.expect("reset");

    assert!(
        attendance::timetable_get(&state, None)
            .await
            .expect("get timetable")
            .is_none()
    );
    assert!(catalog::catalog_list(&state, None).await.expect("list").is_empty());
    assert_eq!(
        attendance::attendance_get_criteria(&state, None)
            .await
            .expect("criteria"),
        75
    );
}

#[tokio::test]
async fn transfer_commands_should_report_invalid_address() {
    let state = memory_state();
    let error = transfer::transfer_receive(&state, "not-an-ip".to_string(), None, None)
        .await
        .expect_err("invalid address");
    assert_eq!(error.code, "transfer_invalid_address");
    assert!(!transfer::transfer_stop_receiving(&state, None).expect("stop receiving"));
    assert_eq!(
        transfer::transfer_get_settings(&state, None)
            .expect("settings")
            .port,
        bunkmate_transfer::DEFAULT_TRANSFER_PORT
    );
}
