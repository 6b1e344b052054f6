use serde::{Deserialize, Serialize};

use bunkmate_kernel::attendance::{
    AttendanceOutlook, BunkAllowance, RecoveryPlan, meets_threshold, outlook, percentage,
};
use bunkmate_protocol::models::{AttendanceOutlookDto, Subject, SubjectAttendanceDto, Timetable};
use bunkmate_protocol::{AppError, AppResult};

pub const ATTENDANCE_INVARIANT_VIOLATED: &str = "attendance_invariant_violated";
pub const TIMETABLE_SUBJECT_NOT_FOUND: &str = "timetable_subject_not_found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceEdit {
    MarkPresent,
    MarkAbsent,
    IncrementAttended,
    DecrementAttended,
    IncrementTotal,
    DecrementTotal,
}

impl AttendanceEdit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MarkPresent => "mark_present",
            Self::MarkAbsent => "mark_absent",
            Self::IncrementAttended => "increment_attended",
            Self::DecrementAttended => "decrement_attended",
            Self::IncrementTotal => "increment_total",
            Self::DecrementTotal => "decrement_total",
        }
    }
}

fn rejected(subject: &Subject, edit: AttendanceEdit, message: &str) -> AppError {
    AppError::new(ATTENDANCE_INVARIANT_VIOLATED, message)
        .with_context("edit", edit.as_str())
        .with_context("subjectId", subject.id.clone())
        .with_context("attended", subject.attended_classes.to_string())
        .with_context("total", subject.total_classes.to_string())
}

/// Applies one edit, keeping `attended <= total`. The subject is untouched on error.
pub fn apply_edit(subject: &mut Subject, edit: AttendanceEdit) -> AppResult<()> {
    let attended = subject.attended_classes;
    let total = subject.total_classes;
    let overflow = || rejected(subject, edit, "Class count is already at its maximum");

    let (next_attended, next_total) = match edit {
        AttendanceEdit::MarkPresent => (
            attended.checked_add(1).ok_or_else(overflow)?,
            total.checked_add(1).ok_or_else(overflow)?,
        ),
        AttendanceEdit::MarkAbsent => (attended, total.checked_add(1).ok_or_else(overflow)?),
        AttendanceEdit::IncrementAttended => {
            if attended >= total {
                return Err(rejected(
                    subject,
                    edit,
                    "Attended classes cannot exceed total classes",
                ));
            }
            (attended + 1, total)
        }
        AttendanceEdit::DecrementAttended => {
            if attended == 0 {
                return Err(rejected(subject, edit, "Attended classes are already zero"));
            }
            (attended - 1, total)
        }
        AttendanceEdit::IncrementTotal => (attended, total.checked_add(1).ok_or_else(overflow)?),
        AttendanceEdit::DecrementTotal => {
            if total <= attended {
                return Err(rejected(
                    subject,
                    edit,
                    "Total classes cannot drop below attended classes",
                ));
            }
            (attended, total - 1)
        }
    };

    subject.attended_classes = next_attended;
    subject.total_classes = next_total;
    Ok(())
}

/// Applies `edit` to the slot `(day, subject_id)` and returns the updated slot.
/// Rejects a timetable containing any slot with more attended than held classes.
pub fn validate_counts(timetable: &Timetable) -> AppResult<()> {
    let violation = timetable
        .slots()
        .find(|(_, subject)| subject.attended_classes > subject.total_classes);
    match violation {
        Some((day, subject)) => Err(AppError::new(
            ATTENDANCE_INVARIANT_VIOLATED,
            "Attended classes cannot exceed total classes",
        )
        .with_context("day", day.name.clone())
        .with_context("subjectId", subject.id.clone())
        .with_context("attended", subject.attended_classes.to_string())
        .with_context("total", subject.total_classes.to_string())),
        None => Ok(()),
    }
}

pub fn apply_edit_in_timetable(
    timetable: &mut Timetable,
    day: &str,
    subject_id: &str,
    edit: AttendanceEdit,
) -> AppResult<Subject> {
    let subject = timetable
        .day_mut(day)
        .and_then(|entry| {
            entry
                .subjects
                .iter_mut()
                .find(|subject| subject.id == subject_id)
        })
        .ok_or_else(|| {
            AppError::new(TIMETABLE_SUBJECT_NOT_FOUND, "Class not found in the timetable")
                .with_context("day", day.to_string())
                .with_context("subjectId", subject_id.to_string())
        })?;

    apply_edit(subject, edit)?;
    Ok(subject.clone())
}

pub fn outlook_dto(value: AttendanceOutlook) -> AttendanceOutlookDto {
    match value {
        AttendanceOutlook::CanBunk(BunkAllowance::Classes(classes)) => {
            AttendanceOutlookDto::CanBunk(Some(classes))
        }
        AttendanceOutlook::CanBunk(BunkAllowance::Unlimited) => AttendanceOutlookDto::CanBunk(None),
        AttendanceOutlook::MustAttend(RecoveryPlan::Classes(classes)) => {
            AttendanceOutlookDto::MustAttend(Some(classes))
        }
        AttendanceOutlook::MustAttend(RecoveryPlan::Unreachable) => {
            AttendanceOutlookDto::MustAttend(None)
        }
    }
}

pub fn attendance_summary(
    name: &str,
    attended: u32,
    total: u32,
    threshold: u32,
) -> SubjectAttendanceDto {
    SubjectAttendanceDto {
        name: name.to_string(),
        attended_classes: attended,
        total_classes: total,
        percentage: percentage(attended, total),
        meets_threshold: meets_threshold(attended, total, threshold),
        outlook: outlook_dto(outlook(attended, total, threshold)),
    }
}

/// Per distinct subject name, counts summed over every slot.
pub fn subject_overview(timetable: &Timetable, threshold: u32) -> Vec<SubjectAttendanceDto> {
    let mut totals: Vec<(String, u32, u32)> = Vec::new();
    for (_, subject) in timetable.slots() {
        let name = subject.name.trim();
        if name.is_empty() {
            continue;
        }
        match totals.iter_mut().find(|(existing, _, _)| existing == name) {
            Some((_, attended, total)) => {
                *attended = attended.saturating_add(subject.attended_classes);
                *total = total.saturating_add(subject.total_classes);
            }
            None => totals.push((
                name.to_string(),
                subject.attended_classes,
                subject.total_classes,
            )),
        }
    }

    totals
        .into_iter()
        .map(|(name, attended, total)| attendance_summary(&name, attended, total, threshold))
        .collect()
}

#[cfg(test)]
#[path = "../tests/attendance/editing_tests.rs"]
mod tests;
