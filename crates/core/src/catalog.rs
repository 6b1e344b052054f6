//! Cross-day subject records.
//!
//! Entries live in a `Vec` and are addressed by index; `index` maps a subject
//! name to its slot so merges stay a set-union keyed by name.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use uuid::Uuid;

use bunkmate_protocol::models::{SubjectCatalogEntry, Topic};
use bunkmate_protocol::{AppError, AppResult};

pub const CATALOG_SUBJECT_NOT_FOUND: &str = "catalog_subject_not_found";
pub const CATALOG_TOPIC_NOT_FOUND: &str = "catalog_topic_not_found";
pub const CATALOG_TOPIC_NAME_EMPTY: &str = "catalog_topic_name_empty";

pub const PALETTE: [&str; 8] = [
    "#EF4444", "#F97316", "#EAB308", "#22C55E", "#14B8A6", "#3B82F6", "#8B5CF6", "#EC4899",
];

const ICON_KEYWORDS: [(&[&str], &str); 7] = [
    (&["math"], "calculator"),
    (&["science", "chemistry", "physics"], "flask"),
    (&["history"], "scroll"),
    (&["language", "english"], "language"),
    (&["art"], "palette"),
    (&["music"], "music"),
    (&["computer", "programming"], "laptop"),
];
const DEFAULT_ICON: &str = "book";

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis() as i64)
        .unwrap_or_default()
}

pub fn icon_for_subject(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    ICON_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

pub fn random_color() -> &'static str {
    let mut value = [0u8; 4];
    rand::rng().fill_bytes(&mut value);
    let index = u32::from_be_bytes(value) as usize % PALETTE.len();
    PALETTE[index]
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectCatalog {
    entries: Vec<SubjectCatalogEntry>,
    index: HashMap<String, usize>,
}

impl SubjectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the arena from stored entries; a repeated name keeps its first entry.
    pub fn from_entries(entries: Vec<SubjectCatalogEntry>) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            let key = entry.name.trim().to_string();
            if key.is_empty() || catalog.index.contains_key(&key) {
                continue;
            }
            catalog.index.insert(key, catalog.entries.len());
            catalog.entries.push(entry);
        }
        catalog
    }

    pub fn entries(&self) -> &[SubjectCatalogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<SubjectCatalogEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name.trim())
    }

    pub fn get(&self, name: &str) -> Option<&SubjectCatalogEntry> {
        self.index
            .get(name.trim())
            .and_then(|position| self.entries.get(*position))
    }

    pub fn get_by_id(&self, subject_id: &str) -> Option<&SubjectCatalogEntry> {
        self.entries.iter().find(|entry| entry.id == subject_id)
    }

    /// Adds an entry for every unseen name and returns the names that were added.
    pub fn merge_names<'a, I>(&mut self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut added = Vec::new();
        for name in names {
            let name = name.trim();
            if name.is_empty() || self.index.contains_key(name) {
                continue;
            }
            self.index.insert(name.to_string(), self.entries.len());
            self.entries.push(SubjectCatalogEntry {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                topics: Vec::new(),
                color: random_color().to_string(),
                icon: icon_for_subject(name).to_string(),
            });
            added.push(name.to_string());
        }
        added
    }

    pub fn add_topic(&mut self, subject_id: &str, name: &str) -> AppResult<Topic> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::new(
                CATALOG_TOPIC_NAME_EMPTY,
                "Topic name cannot be empty",
            ));
        }

        let entry = self.entry_mut(subject_id)?;
        let now = now_millis();
        let topic = Topic {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            notes: String::new(),
            created_at: now,
            modified_at: now,
            is_favorite: false,
        };
        entry.topics.push(topic.clone());
        Ok(topic)
    }

    pub fn update_topic_notes(
        &mut self,
        subject_id: &str,
        topic_id: &str,
        notes: &str,
    ) -> AppResult<Topic> {
        let topic = self.topic_mut(subject_id, topic_id)?;
        topic.notes = notes.to_string();
        topic.modified_at = now_millis();
        Ok(topic.clone())
    }

    pub fn toggle_topic_favorite(&mut self, subject_id: &str, topic_id: &str) -> AppResult<Topic> {
        let topic = self.topic_mut(subject_id, topic_id)?;
        topic.is_favorite = !topic.is_favorite;
        topic.modified_at = now_millis();
        Ok(topic.clone())
    }

    pub fn remove_topic(&mut self, subject_id: &str, topic_id: &str) -> AppResult<Topic> {
        let entry = self.entry_mut(subject_id)?;
        let position = entry
            .topics
            .iter()
            .position(|topic| topic.id == topic_id)
            .ok_or_else(|| topic_not_found(subject_id, topic_id))?;
        Ok(entry.topics.remove(position))
    }

    fn entry_mut(&mut self, subject_id: &str) -> AppResult<&mut SubjectCatalogEntry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id == subject_id)
            .ok_or_else(|| {
                AppError::new(CATALOG_SUBJECT_NOT_FOUND, "Subject not found")
                    .with_context("subjectId", subject_id.to_string())
            })
    }

    fn topic_mut(&mut self, subject_id: &str, topic_id: &str) -> AppResult<&mut Topic> {
        self.entry_mut(subject_id)?
            .topics
            .iter_mut()
            .find(|topic| topic.id == topic_id)
            .ok_or_else(|| topic_not_found(subject_id, topic_id))
    }
}

fn topic_not_found(subject_id: &str, topic_id: &str) -> AppError {
    AppError::new(CATALOG_TOPIC_NOT_FOUND, "Topic not found")
        .with_context("subjectId", subject_id.to_string())
        .with_context("topicId", topic_id.to_string())
}

#[cfg(test)]
#[path = "../tests/catalog/catalog_tests.rs"]
mod tests;
