//! Conversion between engine types and the Google Calendar wire types.

use chrono::Utc;
use google_calendar::types::{Event, EventDateTime, EventReminder, Reminders};
use weeksync_core::{EventDraft, RemoteEvent};

/// Convert a draft to the Google API event shape.
pub fn to_google_event(draft: &EventDraft) -> Event {
    let time_zone = draft.time_zone().to_string();

    // Defaults off, always: the template's overrides are the only
    // reminders the event should carry.
    let reminders = Some(Reminders {
        use_default: false,
        overrides: draft
            .reminders
            .iter()
            .map(|r| EventReminder {
                method: r.channel.as_str().to_string(),
                minutes: r.lead_minutes,
            })
            .collect(),
    });

    Event {
        summary: draft.summary.clone(),
        description: draft.description.clone(),
        start: Some(EventDateTime {
            date: None,
            date_time: Some(draft.start.with_timezone(&Utc)),
            time_zone: time_zone.clone(),
        }),
        end: Some(EventDateTime {
            date: None,
            date_time: Some(draft.end.with_timezone(&Utc)),
            time_zone,
        }),
        recurrence: draft.recurrence.clone(),
        color_id: draft.color_id.clone(),
        reminders,
        ..Default::default()
    }
}

/// Extract the minimal fetched shape the engine needs.
pub fn to_remote_event(event: Event) -> RemoteEvent {
    let start = event.start.and_then(|s| s.date_time);

    RemoteEvent {
        id: event.id,
        summary: event.summary,
        start,
    }
}
