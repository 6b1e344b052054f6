use async_trait::async_trait;

use bunkmate_protocol::AppResult;
use bunkmate_protocol::models::{ClassReminderDto, Timetable, WEEKDAY_NAMES};

/// Notification capability supplied by the host platform.
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    async fn schedule_weekly(&self, reminders: &[ClassReminderDto]) -> AppResult<()>;
    async fn cancel_all(&self) -> AppResult<()>;
}

pub struct NoopReminderScheduler;

#[async_trait]
impl ReminderScheduler for NoopReminderScheduler {
    async fn schedule_weekly(&self, _reminders: &[ClassReminderDto]) -> AppResult<()> {
        Ok(())
    }

    async fn cancel_all(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Parses `HH:mm` (24h).
pub fn parse_clock_time(value: &str) -> Option<(u8, u8)> {
    let (hours, minutes) = value.trim().split_once(':')?;
    if hours.len() != 2
        || minutes.len() != 2
        || !hours.bytes().chain(minutes.bytes()).all(|byte| byte.is_ascii_digit())
    {
        return None;
    }
    let hours = hours.parse::<u8>().ok()?;
    let minutes = minutes.parse::<u8>().ok()?;
    (hours < 24 && minutes < 60).then_some((hours, minutes))
}

fn canonical_weekday(name: &str) -> Option<&'static str> {
    WEEKDAY_NAMES
        .iter()
        .copied()
        .find(|weekday| weekday.eq_ignore_ascii_case(name.trim()))
}

/// One weekly reminder per slot on a known weekday with a valid start time.
pub fn build_class_reminders(timetable: &Timetable) -> Vec<ClassReminderDto> {
    timetable
        .slots()
        .filter_map(|(day, subject)| {
            let weekday = canonical_weekday(&day.name)?;
            let (hours, minutes) = parse_clock_time(&subject.start_time)?;
            Some(ClassReminderDto {
                id: format!("{}-{}", weekday.to_ascii_lowercase(), subject.id),
                title: subject.name.trim().to_string(),
                day: weekday.to_string(),
                start_time: format!("{hours:02}:{minutes:02}"),
            })
        })
        .collect()
}

pub async fn reschedule_reminders(
    scheduler: &dyn ReminderScheduler,
    timetable: &Timetable,
) -> AppResult<usize> {
    let reminders = build_class_reminders(timetable);
    scheduler.cancel_all().await?;
    scheduler.schedule_weekly(&reminders).await?;
    tracing::info!(
        event = "class_reminders_rescheduled",
        reminder_count = reminders.len()
    );
    Ok(reminders.len())
}

#[cfg(test)]
#[path = "../tests/reminders/reminders_tests.rs"]
mod tests;
