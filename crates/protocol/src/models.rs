use serde::{Deserialize, Serialize};

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// One scheduled lecture slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professor: Option<String>,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub attended_classes: u32,
    #[serde(default)]
    pub total_classes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub days: Vec<Day>,
}

impl Timetable {
    pub fn empty_week() -> Self {
        Self {
            days: WEEKDAY_NAMES
                .iter()
                .map(|name| Day {
                    name: (*name).to_string(),
                    subjects: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn day(&self, name: &str) -> Option<&Day> {
        self.days
            .iter()
            .find(|day| day.name.eq_ignore_ascii_case(name))
    }

    pub fn day_mut(&mut self, name: &str) -> Option<&mut Day> {
        self.days
            .iter_mut()
            .find(|day| day.name.eq_ignore_ascii_case(name))
    }

    pub fn slots(&self) -> impl Iterator<Item = (&Day, &Subject)> {
        self.days
            .iter()
            .flat_map(|day| day.subjects.iter().map(move |subject| (day, subject)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub notes: String,
    pub created_at: i64,
    pub modified_at: i64,
    #[serde(default)]
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectCatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub topics: Vec<Topic>,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassReminderDto {
    pub id: String,
    pub title: String,
    pub day: String,
    pub start_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferRole {
    Sender,
    Receiver,
}

impl TransferRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sender => "sender",
            Self::Receiver => "receiver",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferProgressSnapshotDto {
    pub session_id: String,
    pub role: TransferRole,
    pub state: String,
    pub transferred_bytes: u64,
    pub total_bytes: u64,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummaryDto {
    pub day_count: usize,
    pub slot_count: usize,
    pub subject_names: Vec<String>,
    pub added_catalog_entries: Vec<String>,
}

/// `None` stands for an unlimited bunk allowance or an unreachable threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "classes")]
pub enum AttendanceOutlookDto {
    CanBunk(Option<u32>),
    MustAttend(Option<u32>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAttendanceDto {
    pub name: String,
    pub attended_classes: u32,
    pub total_classes: u32,
    pub percentage: u32,
    pub meets_threshold: bool,
    pub outlook: AttendanceOutlookDto,
}

/// A listening share session as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareSessionDto {
    pub session_id: String,
    pub local_address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiveStatus {
    Received,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveResultDto {
    pub session_id: String,
    pub status: ReceiveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<IngestSummaryDto>,
    /// `None` when the payload was saved but reminders could not be rescheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_count: Option<usize>,
}
