//! Weekly event templates.
//!
//! A template is a dateless description of one recurring event. Templates
//! are built and validated up front (outside this crate) and never mutated
//! at runtime; the engine only expands them into dated occurrences.

use chrono::{Duration, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;

use crate::error::{WeekSyncError, WeekSyncResult};
use crate::week::{self, Occurrence};

/// Notification channel for a reminder override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderChannel {
    Popup,
    Email,
}

impl ReminderChannel {
    /// Remote method name for this channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderChannel::Popup => "popup",
            ReminderChannel::Email => "email",
        }
    }
}

/// A single reminder override: channel plus lead time before the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderSpec {
    pub channel: ReminderChannel,
    pub lead_minutes: i64,
}

/// A declarative description of one recurring weekly event.
///
/// The title is the natural key used to match a template against the remote
/// event it produced in a previous run.
#[derive(Debug, Clone)]
pub struct Template {
    pub title: String,
    pub description: String,
    /// Wall-clock start time as `"HH:MM"`, interpreted in the target zone.
    pub time_of_day: String,
    pub duration: Duration,
    /// Weekdays this event occurs on. Duplicate entries are deliberate:
    /// each one becomes its own occurrence, even on the same day.
    pub weekdays: Vec<Weekday>,
    /// Explicit reminder overrides; remote defaults are always disabled.
    pub reminders: Vec<ReminderSpec>,
    /// Opaque color tag forwarded to the remote system.
    pub color_id: String,
}

impl Template {
    /// Parse the template's wall-clock start time.
    ///
    /// An unparsable value is a configuration error for this template;
    /// callers report it and move on to the next template.
    pub fn start_time(&self) -> WeekSyncResult<NaiveTime> {
        week::parse_time_of_day(&self.time_of_day).map_err(|e| {
            WeekSyncError::Config(format!(
                "Template '{}' has invalid time '{}': {}",
                self.title, self.time_of_day, e
            ))
        })
    }

    /// Expand into concrete occurrences anchored to the week beginning at
    /// `week_start`, one per weekday entry, in declaration order.
    pub fn expand(&self, week_start: NaiveDate, tz: Tz) -> WeekSyncResult<Vec<Occurrence>> {
        let time = self.start_time()?;

        let mut occurrences = Vec::with_capacity(self.weekdays.len());
        for weekday in &self.weekdays {
            occurrences.push(week::resolve_occurrence(
                week_start,
                *weekday,
                time,
                self.duration,
                tz,
            )?);
        }

        Ok(occurrences)
    }
}
