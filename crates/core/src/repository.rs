use std::sync::Arc;

use bunkmate_db::{KeyValueStore, PERCENTAGE_KEY, SUBJECTS_KEY, TIMETABLE_KEY, USER_DATA_KEYS};
use bunkmate_kernel::attendance::MAX_THRESHOLD_PERCENT;
use bunkmate_protocol::models::{
    IngestSummaryDto, Subject, SubjectAttendanceDto, SubjectCatalogEntry, Timetable, Topic,
};
use bunkmate_protocol::{AppError, AppResult, ResultExt};

use crate::attendance::{
    AttendanceEdit, apply_edit_in_timetable, subject_overview, validate_counts,
};
use crate::catalog::SubjectCatalog;
use crate::ingest::{self, distinct_subject_names, parse_payload};

pub const DEFAULT_CRITERIA_PERCENT: u32 = 75;
pub const ATTENDANCE_CRITERIA_INVALID: &str = "attendance_criteria_invalid";

/// Timetable, catalog and criteria persisted through a `KeyValueStore`.
#[derive(Clone)]
pub struct TimetableRepository {
    store: Arc<dyn KeyValueStore>,
}

impl TimetableRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    pub async fn load_timetable(&self) -> AppResult<Option<Timetable>> {
        let Some(raw) = self.store.get_string(TIMETABLE_KEY).await? else {
            return Ok(None);
        };
        let timetable = serde_json::from_str::<Timetable>(&raw)
            .with_code("timetable_corrupted", "The saved timetable could not be read")?;
        Ok(Some(timetable))
    }

    /// Persists the timetable together with the catalog merged from its subject names.
    /// Nothing is written when any slot has `attended > total`.
    pub async fn save_timetable(&self, timetable: &Timetable) -> AppResult<Vec<String>> {
        validate_counts(timetable)?;
        let mut catalog = self.load_catalog().await?;
        let names = distinct_subject_names(timetable);
        let added = catalog.merge_names(names.iter().map(String::as_str));
        self.persist_pair(timetable, &catalog).await?;
        tracing::info!(
            event = "timetable_saved",
            day_count = timetable.days.len(),
            added_subjects = added.len()
        );
        Ok(added)
    }

    pub async fn load_catalog(&self) -> AppResult<SubjectCatalog> {
        let Some(raw) = self.store.get_string(SUBJECTS_KEY).await? else {
            return Ok(SubjectCatalog::new());
        };
        let entries = serde_json::from_str::<Vec<SubjectCatalogEntry>>(&raw)
            .with_code("catalog_corrupted", "The saved subject list could not be read")?;
        Ok(SubjectCatalog::from_entries(entries))
    }

    pub async fn save_catalog(&self, catalog: &SubjectCatalog) -> AppResult<()> {
        let raw = serde_json::to_string(catalog.entries())?;
        self.store.set_string(SUBJECTS_KEY, &raw).await
    }

    /// Stored threshold, or the default when it is missing or unreadable.
    pub async fn load_criteria(&self) -> AppResult<u32> {
        let Some(raw) = self.store.get_string(PERCENTAGE_KEY).await? else {
            return Ok(DEFAULT_CRITERIA_PERCENT);
        };
        match raw.trim().parse::<u32>() {
            Ok(value) if value <= MAX_THRESHOLD_PERCENT => Ok(value),
            _ => {
                tracing::warn!(
                    event = "attendance_criteria_invalid",
                    stored_value = raw.as_str(),
                    fallback = DEFAULT_CRITERIA_PERCENT
                );
                Ok(DEFAULT_CRITERIA_PERCENT)
            }
        }
    }

    pub async fn save_criteria(&self, percent: u32) -> AppResult<()> {
        if percent > MAX_THRESHOLD_PERCENT {
            return Err(AppError::new(
                ATTENDANCE_CRITERIA_INVALID,
                "Attendance criteria must be between 0 and 100",
            )
            .with_context("percent", percent.to_string()));
        }
        self.store
            .set_string(PERCENTAGE_KEY, &percent.to_string())
            .await
    }

    /// Ingests a received payload and persists the timetable and merged catalog.
    pub async fn apply_received(&self, bytes: &[u8]) -> AppResult<IngestSummaryDto> {
        let raw = parse_payload(bytes)?;
        self.apply_received_value(&raw).await
    }

    pub async fn apply_received_value(
        &self,
        raw: &serde_json::Value,
    ) -> AppResult<IngestSummaryDto> {
        let catalog = self.load_catalog().await?;
        let outcome = ingest::ingest(raw, &catalog)?;
        self.persist_pair(&outcome.timetable, &outcome.catalog).await?;
        tracing::info!(
            event = "timetable_received_applied",
            day_count = outcome.summary.day_count,
            slot_count = outcome.summary.slot_count,
            added_subjects = outcome.summary.added_catalog_entries.len()
        );
        Ok(outcome.summary)
    }

    pub async fn reset_all(&self) -> AppResult<()> {
        self.store.remove_many(&USER_DATA_KEYS).await?;
        tracing::info!(event = "user_data_reset");
        Ok(())
    }

    pub async fn edit_attendance(
        &self,
        day: &str,
        subject_id: &str,
        edit: AttendanceEdit,
    ) -> AppResult<Subject> {
        let mut timetable = self.require_timetable().await?;
        let subject = apply_edit_in_timetable(&mut timetable, day, subject_id, edit)?;
        let raw = serde_json::to_string(&timetable)?;
        self.store.set_string(TIMETABLE_KEY, &raw).await?;
        tracing::debug!(
            event = "attendance_edited",
            edit = edit.as_str(),
            subject_id,
            attended = subject.attended_classes,
            total = subject.total_classes
        );
        Ok(subject)
    }

    pub async fn subject_overview(&self) -> AppResult<Vec<SubjectAttendanceDto>> {
        let threshold = self.load_criteria().await?;
        let timetable = self.load_timetable().await?.unwrap_or_default();
        Ok(subject_overview(&timetable, threshold))
    }

    pub async fn add_topic(&self, subject_id: &str, name: &str) -> AppResult<Topic> {
        let mut catalog = self.load_catalog().await?;
        let topic = catalog.add_topic(subject_id, name)?;
        self.save_catalog(&catalog).await?;
        Ok(topic)
    }

    pub async fn update_topic_notes(
        &self,
        subject_id: &str,
        topic_id: &str,
        notes: &str,
    ) -> AppResult<Topic> {
        let mut catalog = self.load_catalog().await?;
        let topic = catalog.update_topic_notes(subject_id, topic_id, notes)?;
        self.save_catalog(&catalog).await?;
        Ok(topic)
    }

    pub async fn toggle_topic_favorite(
        &self,
        subject_id: &str,
        topic_id: &str,
    ) -> AppResult<Topic> {
        let mut catalog = self.load_catalog().await?;
        let topic = catalog.toggle_topic_favorite(subject_id, topic_id)?;
        self.save_catalog(&catalog).await?;
        Ok(topic)
    }

    pub async fn remove_topic(&self, subject_id: &str, topic_id: &str) -> AppResult<Topic> {
        let mut catalog = self.load_catalog().await?;
        let topic = catalog.remove_topic(subject_id, topic_id)?;
        self.save_catalog(&catalog).await?;
        Ok(topic)
    }

    async fn require_timetable(&self) -> AppResult<Timetable> {
        self.load_timetable().await?.ok_or_else(|| {
            AppError::new("timetable_not_found", "No timetable has been saved yet")
        })
    }

    async fn persist_pair(&self, timetable: &Timetable, catalog: &SubjectCatalog) -> AppResult<()> {
        let timetable_raw = serde_json::to_string(timetable)?;
        let catalog_raw = serde_json::to_string(catalog.entries())?;
        self.store
            .set_many(&[
                (TIMETABLE_KEY, timetable_raw.as_str()),
                (SUBJECTS_KEY, catalog_raw.as_str()),
            ])
            .await
    }
}

#[cfg(test)]
#[path = "../tests/repository/repository_tests.rs"]
mod tests;
