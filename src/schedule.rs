//! Schedule file loading.
//!
//! The schedule is the operator-authored list of weekly templates. Loading
//! it is the only place templates are constructed: the engine receives an
//! already-built, validated sequence and never assembles one itself.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use weeksync_core::{ReminderChannel, ReminderSpec, Template};

/// Lead offset of the secondary email reminder over the popup one.
const EMAIL_REMINDER_EXTRA_MINUTES: i64 = 5;

fn default_reminder_lead() -> i64 {
    15
}

#[derive(Debug, Deserialize)]
struct ScheduleFile {
    /// When set, every template gets a second, email reminder at
    /// lead + 5 minutes in addition to the popup one.
    #[serde(default)]
    email_reminders: bool,

    #[serde(rename = "template", default)]
    templates: Vec<TemplateEntry>,
}

#[derive(Debug, Deserialize)]
struct TemplateEntry {
    title: String,
    #[serde(default)]
    description: String,
    /// Wall-clock start, "HH:MM".
    time: String,
    /// Human-readable span, e.g. "90m" or "1h 30m".
    duration: String,
    /// Weekday names; repeating a day repeats the occurrence.
    weekdays: Vec<String>,
    #[serde(default = "default_reminder_lead")]
    reminder_lead_minutes: i64,
    /// Opaque color tag forwarded to the calendar.
    #[serde(default)]
    color: String,
}

/// Load and validate the schedule, building the template list.
pub fn load(path: &Path) -> Result<Vec<Template>> {
    if !path.exists() {
        bail!(
            "No schedule found at {}.\n\n\
            Create it with entries like:\n\n\
            email_reminders = true\n\n\
            [[template]]\n\
            title = \"Gym Workout\"\n\
            description = \"Gym session\"\n\
            time = \"06:00\"\n\
            duration = \"90m\"\n\
            weekdays = [\"mon\", \"wed\", \"fri\"]\n\
            reminder_lead_minutes = 30\n\
            color = \"10\"",
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schedule from {}", path.display()))?;

    let file: ScheduleFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse schedule from {}", path.display()))?;

    build_templates(file)
}

fn build_templates(file: ScheduleFile) -> Result<Vec<Template>> {
    let ScheduleFile {
        email_reminders,
        templates: entries,
    } = file;

    let mut templates = Vec::with_capacity(entries.len());
    let mut seen_titles = HashSet::new();

    for entry in entries {
        if !seen_titles.insert(entry.title.clone()) {
            bail!("Duplicate template title: '{}'", entry.title);
        }
        if entry.weekdays.is_empty() {
            bail!("Template '{}' has no weekdays", entry.title);
        }
        if entry.reminder_lead_minutes < 0 {
            bail!(
                "Template '{}' has a negative reminder lead",
                entry.title
            );
        }

        let duration = humantime::parse_duration(&entry.duration).with_context(|| {
            format!(
                "Invalid duration '{}' for template '{}'",
                entry.duration, entry.title
            )
        })?;
        let duration = chrono::Duration::from_std(duration).with_context(|| {
            format!(
                "Duration '{}' for template '{}' is out of range",
                entry.duration, entry.title
            )
        })?;

        let weekdays = entry
            .weekdays
            .iter()
            .map(|day| {
                day.parse::<chrono::Weekday>().map_err(|_| {
                    anyhow::anyhow!("Invalid weekday '{}' in template '{}'", day, entry.title)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut reminders = vec![ReminderSpec {
            channel: ReminderChannel::Popup,
            lead_minutes: entry.reminder_lead_minutes,
        }];
        if email_reminders {
            reminders.push(ReminderSpec {
                channel: ReminderChannel::Email,
                lead_minutes: entry.reminder_lead_minutes + EMAIL_REMINDER_EXTRA_MINUTES,
            });
        }

        templates.push(Template {
            title: entry.title,
            description: entry.description,
            time_of_day: entry.time,
            duration,
            weekdays,
            reminders,
            color_id: entry.color,
        });
    }

    Ok(templates)
}
