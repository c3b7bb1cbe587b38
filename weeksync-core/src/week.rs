//! Week anchoring and occurrence resolution.
//!
//! Maps abstract (weekday, wall-clock time) pairs onto concrete instants in
//! a target time zone, anchored to the upcoming calendar week.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Weekday};
use chrono_tz::Tz;

use crate::error::{WeekSyncError, WeekSyncResult};

/// One concrete dated instance of a template.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

/// The Monday that begins the next full week relative to `today`.
///
/// Always advances by 1–7 days: a Monday input lands on the following
/// Monday, never on itself.
pub fn next_week_start(today: NaiveDate) -> NaiveDate {
    let days_ahead = (8 - today.weekday().num_days_from_sunday() as i64) % 7;
    let days_ahead = if days_ahead == 0 { 7 } else { days_ahead };
    today + Duration::days(days_ahead)
}

/// Parse a wall-clock `"HH:MM"` time of day.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value, "%H:%M")
}

/// Locate `weekday` within the week starting at `week_start` and resolve
/// the start/end instants in `tz`.
pub fn resolve_occurrence(
    week_start: NaiveDate,
    weekday: Weekday,
    time_of_day: NaiveTime,
    duration: Duration,
    tz: Tz,
) -> WeekSyncResult<Occurrence> {
    let offset = (weekday.num_days_from_sunday() as i64
        - week_start.weekday().num_days_from_sunday() as i64
        + 7)
        % 7;

    resolve_at(week_start + Duration::days(offset), time_of_day, duration, tz)
}

/// Resolve the start/end instants for an event on an explicit date.
///
/// Fails if the wall-clock time does not exist on that date in `tz`
/// (a DST transition gap).
pub fn resolve_at(
    date: NaiveDate,
    time_of_day: NaiveTime,
    duration: Duration,
    tz: Tz,
) -> WeekSyncResult<Occurrence> {
    let start = tz
        .from_local_datetime(&date.and_time(time_of_day))
        .earliest()
        .ok_or_else(|| {
            WeekSyncError::Time(format!(
                "{} {} does not exist in {}",
                date,
                time_of_day,
                tz.name()
            ))
        })?;

    Ok(Occurrence {
        start,
        end: start + duration,
    })
}
