//! Wire-shaped event types exchanged with a calendar gateway.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::template::{ReminderSpec, Template};
use crate::week::Occurrence;

/// Recurrence rule attached to every materialized occurrence.
pub const WEEKLY_RRULE: &str = "RRULE:FREQ=WEEKLY";

/// A fully described event ready for transmission to a remote calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    /// RRULE lines; weekly templates carry [`WEEKLY_RRULE`].
    pub recurrence: Vec<String>,
    /// Explicit reminder overrides. Remote defaults are always disabled,
    /// even when this list is empty.
    pub reminders: Vec<ReminderSpec>,
    /// Opaque color tag, forwarded verbatim.
    pub color_id: String,
}

impl EventDraft {
    /// Build the remote representation of one occurrence of a template.
    pub fn from_template(template: &Template, occurrence: &Occurrence) -> EventDraft {
        EventDraft {
            summary: template.title.clone(),
            description: template.description.clone(),
            start: occurrence.start,
            end: occurrence.end,
            recurrence: vec![WEEKLY_RRULE.to_string()],
            reminders: template.reminders.clone(),
            color_id: template.color_id.clone(),
        }
    }

    /// IANA zone name the start/end instants are qualified with.
    pub fn time_zone(&self) -> &'static str {
        self.start.timezone().name()
    }
}

/// The minimal shape of an event fetched back from a remote calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEvent {
    pub id: String,
    pub summary: String,
    /// Start instant, if the remote reported one. All-day events have none.
    pub start: Option<DateTime<Utc>>,
}
