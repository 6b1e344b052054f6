//! Turns a received payload into the canonical timetable shape.

use serde::Deserialize;
use uuid::Uuid;

use bunkmate_protocol::models::{Day, IngestSummaryDto, Subject, Timetable};
use bunkmate_protocol::{AppError, AppResult};

use crate::catalog::SubjectCatalog;

pub const TIMETABLE_INVALID_FORMAT: &str = "timetable_invalid_format";

#[derive(Debug, Deserialize)]
struct IncomingTimetable {
    days: Vec<IncomingDay>,
}

#[derive(Debug, Deserialize)]
struct IncomingDay {
    name: String,
    #[serde(default)]
    subjects: Option<Vec<IncomingSubject>>,
}

// Counters are not read; ingest resets them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingSubject {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    professor: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub timetable: Timetable,
    pub catalog: SubjectCatalog,
    pub summary: IngestSummaryDto,
}

fn invalid_format(cause: impl Into<String>) -> AppError {
    AppError::new(
        TIMETABLE_INVALID_FORMAT,
        "The received data is not a valid timetable",
    )
    .with_cause(cause)
}

pub fn parse_payload(bytes: &[u8]) -> AppResult<serde_json::Value> {
    let text = std::str::from_utf8(bytes).map_err(|error| {
        invalid_format(error.to_string()).with_context("byteLength", bytes.len().to_string())
    })?;
    serde_json::from_str(text).map_err(|error| {
        invalid_format(error.to_string()).with_context("byteLength", bytes.len().to_string())
    })
}

/// Canonical timetable with every counter reset and every slot carrying an id.
pub fn normalize(raw: &serde_json::Value) -> AppResult<Timetable> {
    if !raw.get("days").is_some_and(serde_json::Value::is_array) {
        return Err(invalid_format("`days` must be a list").with_context("field", "days"));
    }
    let incoming = IncomingTimetable::deserialize(raw)
        .map_err(|error| invalid_format(error.to_string()))?;

    let days = incoming
        .days
        .into_iter()
        .map(|day| Day {
            name: day.name,
            subjects: day
                .subjects
                .unwrap_or_default()
                .into_iter()
                .map(normalize_subject)
                .collect(),
        })
        .collect();
    Ok(Timetable { days })
}

fn normalize_subject(subject: IncomingSubject) -> Subject {
    let id = subject
        .id
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    Subject {
        id,
        name: subject.name,
        professor: subject.professor.filter(|value| !value.trim().is_empty()),
        start_time: subject.start_time.unwrap_or_default(),
        end_time: subject.end_time.unwrap_or_default(),
        attended_classes: 0,
        total_classes: 0,
    }
}

/// Distinct trimmed subject names in first-seen order.
pub fn distinct_subject_names(timetable: &Timetable) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (_, subject) in timetable.slots() {
        let name = subject.name.trim();
        if name.is_empty() || names.iter().any(|existing| existing == name) {
            continue;
        }
        names.push(name.to_string());
    }
    names
}

/// Normalizes `raw` and merges its subjects into a copy of `catalog`.
///
/// Nothing is written here; on error neither output exists, so callers
/// never persist half an ingest.
pub fn ingest(raw: &serde_json::Value, catalog: &SubjectCatalog) -> AppResult<IngestOutcome> {
    let timetable = normalize(raw)?;
    let subject_names = distinct_subject_names(&timetable);

    let mut catalog = catalog.clone();
    let added_catalog_entries = catalog.merge_names(subject_names.iter().map(String::as_str));

    let summary = IngestSummaryDto {
        day_count: timetable.days.len(),
        slot_count: timetable.slots().count(),
        subject_names,
        added_catalog_entries,
    };
    Ok(IngestOutcome {
        timetable,
        catalog,
        summary,
    })
}

#[cfg(test)]
#[path = "../tests/ingest/ingest_tests.rs"]
mod tests;
