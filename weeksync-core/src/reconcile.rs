//! Reconciliation of the declared template set against remote state.
//!
//! For each template the reconciler decides between three paths: create
//! fresh events (no id on record), update the tracked event in place, or
//! recreate it after a failed fetch/update (self-healing). The output is a
//! per-template outcome list plus the next identity store snapshot.

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::event::EventDraft;
use crate::gateway::CalendarGateway;
use crate::store::IdentityStore;
use crate::template::Template;
use crate::week::{self, Occurrence};

/// How a template was settled (or not) during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// No id was on record; fresh events were created.
    Created { occurrences: usize },
    /// The tracked event was updated in place.
    Updated,
    /// The tracked event was unreachable; replacements were created.
    Recreated { occurrences: usize },
    /// Nothing was created or updated; retried as a fresh create next run.
    Failed,
}

/// Per-template result of a reconciliation run.
#[derive(Debug, Clone)]
pub struct TemplateOutcome {
    pub title: String,
    pub action: ReconcileAction,
    /// The id recorded in the next store snapshot, if any.
    pub event_id: Option<String>,
    /// Errors encountered along the way: per-occurrence create failures,
    /// or the fetch/update failure that triggered a recovery.
    pub errors: Vec<String>,
}

/// Result of a full reconciliation run.
#[derive(Debug)]
pub struct ReconcileReport {
    pub outcomes: Vec<TemplateOutcome>,
    /// The next store snapshot: one entry per settled template.
    pub store: IdentityStore,
}

impl ReconcileReport {
    /// (created, updated, recreated, failed) template counts.
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for outcome in &self.outcomes {
            match outcome.action {
                ReconcileAction::Created { .. } => counts.0 += 1,
                ReconcileAction::Updated => counts.1 += 1,
                ReconcileAction::Recreated { .. } => counts.2 += 1,
                ReconcileAction::Failed => counts.3 += 1,
            }
        }
        counts
    }

    pub fn has_errors(&self) -> bool {
        self.outcomes.iter().any(|o| !o.errors.is_empty())
    }
}

/// Drives one reconciliation pass: templates in, settled remote events and
/// a fresh identity store out.
pub struct Reconciler<'a, G> {
    gateway: &'a G,
    tz: Tz,
    week_start: NaiveDate,
}

impl<'a, G: CalendarGateway> Reconciler<'a, G> {
    pub fn new(gateway: &'a G, tz: Tz, week_start: NaiveDate) -> Self {
        Reconciler {
            gateway,
            tz,
            week_start,
        }
    }

    /// Reconcile every template against the previous run's store.
    ///
    /// Failure isolation is per template: no error aborts the run, and a
    /// template that failed entirely is absent from the returned store so
    /// the next run retries it as a fresh create.
    pub async fn run(&self, templates: &[Template], store: &IdentityStore) -> ReconcileReport {
        let mut outcomes = Vec::with_capacity(templates.len());
        let mut next = IdentityStore::new();

        for template in templates {
            let outcome = self
                .reconcile_template(template, store.get(&template.title))
                .await;

            if let Some(id) = &outcome.event_id {
                next.insert(outcome.title.clone(), id.clone());
            }
            outcomes.push(outcome);
        }

        ReconcileReport {
            outcomes,
            store: next,
        }
    }

    async fn reconcile_template(
        &self,
        template: &Template,
        known_id: Option<&str>,
    ) -> TemplateOutcome {
        let occurrences = match template.expand(self.week_start, self.tz) {
            Ok(occurrences) => occurrences,
            Err(e) => {
                return TemplateOutcome {
                    title: template.title.clone(),
                    action: ReconcileAction::Failed,
                    event_id: None,
                    errors: vec![e.to_string()],
                };
            }
        };

        match known_id {
            None => self.create_fresh(template, &occurrences).await,
            Some(id) => match self.update_in_place(template, id).await {
                Ok(()) => TemplateOutcome {
                    title: template.title.clone(),
                    action: ReconcileAction::Updated,
                    event_id: Some(id.to_string()),
                    errors: Vec::new(),
                },
                Err(update_err) => {
                    // The tracked event is gone or unreachable. Recreate it
                    // from scratch instead of treating the stale reference
                    // as fatal.
                    let mut outcome = self.create_fresh(template, &occurrences).await;
                    outcome.errors.insert(0, update_err);
                    if let ReconcileAction::Created { occurrences } = outcome.action {
                        outcome.action = ReconcileAction::Recreated { occurrences };
                    }
                    outcome
                }
            },
        }
    }

    /// Create one remote event per occurrence. The id of the last
    /// successful create becomes the tracked id for the template's title;
    /// individual failures are recorded and skipped.
    async fn create_fresh(&self, template: &Template, occurrences: &[Occurrence]) -> TemplateOutcome {
        let mut last_id = None;
        let mut created = 0;
        let mut errors = Vec::new();

        for occurrence in occurrences {
            let draft = EventDraft::from_template(template, occurrence);
            match self.gateway.create_event(&draft).await {
                Ok(id) => {
                    last_id = Some(id);
                    created += 1;
                }
                Err(e) => errors.push(format!(
                    "Failed to create '{}' at {}: {}",
                    template.title, occurrence.start, e
                )),
            }
        }

        let action = if last_id.is_some() {
            ReconcileAction::Created {
                occurrences: created,
            }
        } else {
            ReconcileAction::Failed
        };

        TemplateOutcome {
            title: template.title.clone(),
            action,
            event_id: last_id,
            errors,
        }
    }

    /// Fetch the tracked event and overwrite it wholesale with the
    /// template's current shape, keeping the day it already sits on but
    /// replacing the time of day.
    async fn update_in_place(&self, template: &Template, event_id: &str) -> Result<(), String> {
        let existing = self.gateway.get_event(event_id).await.map_err(|e| {
            format!(
                "Failed to fetch '{}' ({}): {}",
                template.title, event_id, e
            )
        })?;

        // The update anchors to the existing event's day; without a start
        // instant there is nothing to anchor to, so recreate instead.
        let day = existing
            .start
            .map(|start| start.with_timezone(&self.tz).date_naive())
            .ok_or_else(|| {
                format!(
                    "Remote event for '{}' ({}) has no start time",
                    template.title, event_id
                )
            })?;

        let time = template.start_time().map_err(|e| e.to_string())?;
        let occurrence = week::resolve_at(day, time, template.duration, self.tz)
            .map_err(|e| e.to_string())?;

        let draft = EventDraft::from_template(template, &occurrence);
        self.gateway
            .update_event(event_id, &draft)
            .await
            .map_err(|e| {
                format!(
                    "Failed to update '{}' ({}): {}",
                    template.title, event_id, e
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{WeekSyncError, WeekSyncResult};
    use crate::event::RemoteEvent;
    use crate::template::{ReminderChannel, ReminderSpec};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate, Timelike, Utc, Weekday};
    use chrono_tz::Europe::Berlin;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory gateway that records calls; create failures are scripted
    /// per event title.
    #[derive(Default)]
    struct MockGateway {
        events: Mutex<HashMap<String, EventDraft>>,
        next_id: Mutex<u32>,
        fail_creates_for: Vec<String>,
        create_calls: Mutex<Vec<String>>,
        update_calls: Mutex<Vec<String>>,
    }

    impl MockGateway {
        fn failing_creates(titles: &[&str]) -> Self {
            MockGateway {
                fail_creates_for: titles.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            }
        }

        fn create_count(&self) -> usize {
            self.create_calls.lock().unwrap().len()
        }

        fn stored(&self, event_id: &str) -> Option<EventDraft> {
            self.events.lock().unwrap().get(event_id).cloned()
        }

        fn remove(&self, event_id: &str) {
            self.events.lock().unwrap().remove(event_id);
        }
    }

    #[async_trait]
    impl CalendarGateway for MockGateway {
        async fn create_event(&self, draft: &EventDraft) -> WeekSyncResult<String> {
            self.create_calls.lock().unwrap().push(draft.summary.clone());

            if self.fail_creates_for.contains(&draft.summary) {
                return Err(WeekSyncError::Gateway("create rejected".into()));
            }

            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let id = format!("evt-{}", *next);
            self.events.lock().unwrap().insert(id.clone(), draft.clone());
            Ok(id)
        }

        async fn get_event(&self, event_id: &str) -> WeekSyncResult<RemoteEvent> {
            match self.events.lock().unwrap().get(event_id) {
                Some(draft) => Ok(RemoteEvent {
                    id: event_id.to_string(),
                    summary: draft.summary.clone(),
                    start: Some(draft.start.with_timezone(&Utc)),
                }),
                None => Err(WeekSyncError::Gateway(format!("{} not found", event_id))),
            }
        }

        async fn update_event(&self, event_id: &str, draft: &EventDraft) -> WeekSyncResult<()> {
            self.update_calls.lock().unwrap().push(event_id.to_string());

            match self.events.lock().unwrap().get_mut(event_id) {
                Some(existing) => {
                    *existing = draft.clone();
                    Ok(())
                }
                None => Err(WeekSyncError::Gateway(format!("{} not found", event_id))),
            }
        }

        async fn delete_event(&self, event_id: &str) -> WeekSyncResult<()> {
            match self.events.lock().unwrap().remove(event_id) {
                Some(_) => Ok(()),
                None => Err(WeekSyncError::Gateway(format!("{} not found", event_id))),
            }
        }
    }

    fn make_template(title: &str, weekdays: &[Weekday]) -> Template {
        Template {
            title: title.to_string(),
            description: format!("{} description", title),
            time_of_day: "09:00".to_string(),
            duration: Duration::minutes(30),
            weekdays: weekdays.to_vec(),
            reminders: vec![ReminderSpec {
                channel: ReminderChannel::Popup,
                lead_minutes: 15,
            }],
            color_id: "1".to_string(),
        }
    }

    fn week_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() // a Monday
    }

    #[tokio::test]
    async fn test_first_run_creates_each_occurrence() {
        let gateway = MockGateway::default();
        let reconciler = Reconciler::new(&gateway, Berlin, week_start());
        let templates = vec![make_template("Standup", &[Weekday::Tue, Weekday::Thu])];

        let report = reconciler.run(&templates, &IdentityStore::new()).await;

        assert_eq!(gateway.create_count(), 2);
        assert_eq!(
            report.outcomes[0].action,
            ReconcileAction::Created { occurrences: 2 }
        );

        // The last weekday's instance is the tracked one
        assert_eq!(report.store.get("Standup"), Some("evt-2"));
        let tracked = gateway.stored("evt-2").unwrap();
        assert_eq!(
            tracked.start.date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()
        );
        assert_eq!(tracked.start.time().hour(), 9);
        assert_eq!(tracked.recurrence, vec!["RRULE:FREQ=WEEKLY".to_string()]);
        assert_eq!(tracked.reminders, templates[0].reminders);
    }

    #[tokio::test]
    async fn test_second_run_only_updates() {
        let gateway = MockGateway::default();
        let reconciler = Reconciler::new(&gateway, Berlin, week_start());
        let templates = vec![
            make_template("Standup", &[Weekday::Tue, Weekday::Thu]),
            make_template("Lunch", &[Weekday::Mon]),
        ];

        let first = reconciler.run(&templates, &IdentityStore::new()).await;
        let creates_after_first = gateway.create_count();

        let second = reconciler.run(&templates, &first.store).await;

        assert_eq!(gateway.create_count(), creates_after_first);
        assert!(second
            .outcomes
            .iter()
            .all(|o| o.action == ReconcileAction::Updated));
        assert_eq!(second.store, first.store);
    }

    #[tokio::test]
    async fn test_out_of_band_deletion_is_recreated_with_fresh_id() {
        let gateway = MockGateway::default();
        let reconciler = Reconciler::new(&gateway, Berlin, week_start());
        let templates = vec![make_template("Standup", &[Weekday::Tue])];

        let first = reconciler.run(&templates, &IdentityStore::new()).await;
        let old_id = first.store.get("Standup").unwrap().to_string();

        // Someone deletes the event behind our back
        gateway.remove(&old_id);

        let second = reconciler.run(&templates, &first.store).await;

        assert_eq!(
            second.outcomes[0].action,
            ReconcileAction::Recreated { occurrences: 1 }
        );
        let new_id = second.store.get("Standup").unwrap();
        assert_ne!(new_id, old_id);
        assert!(gateway.stored(new_id).is_some());
        assert!(!second.outcomes[0].errors.is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_is_isolated_per_template() {
        let gateway = MockGateway::failing_creates(&["Lunch"]);
        let reconciler = Reconciler::new(&gateway, Berlin, week_start());
        let templates = vec![
            make_template("Standup", &[Weekday::Tue]),
            make_template("Lunch", &[Weekday::Mon, Weekday::Wed]),
            make_template("Gym Workout", &[Weekday::Fri]),
        ];

        let report = reconciler.run(&templates, &IdentityStore::new()).await;

        assert!(report.store.get("Standup").is_some());
        assert!(report.store.get("Gym Workout").is_some());
        assert_eq!(report.store.get("Lunch"), None);

        assert_eq!(report.outcomes[1].action, ReconcileAction::Failed);
        assert_eq!(report.outcomes[1].errors.len(), 2);
        assert_eq!(report.counts(), (2, 0, 0, 1));
    }

    #[tokio::test]
    async fn test_partial_create_failure_tracks_last_success() {
        // Every occurrence shares the title, so a per-occurrence failure
        // script needs a separate gateway: fail only the second call.
        struct SecondCreateFails {
            inner: MockGateway,
        }

        #[async_trait]
        impl CalendarGateway for SecondCreateFails {
            async fn create_event(&self, draft: &EventDraft) -> WeekSyncResult<String> {
                if self.inner.create_count() == 1 {
                    self.inner
                        .create_calls
                        .lock()
                        .unwrap()
                        .push(draft.summary.clone());
                    return Err(WeekSyncError::Gateway("quota exceeded".into()));
                }
                self.inner.create_event(draft).await
            }

            async fn get_event(&self, event_id: &str) -> WeekSyncResult<RemoteEvent> {
                self.inner.get_event(event_id).await
            }

            async fn update_event(&self, event_id: &str, draft: &EventDraft) -> WeekSyncResult<()> {
                self.inner.update_event(event_id, draft).await
            }

            async fn delete_event(&self, event_id: &str) -> WeekSyncResult<()> {
                self.inner.delete_event(event_id).await
            }
        }

        let gateway = SecondCreateFails {
            inner: MockGateway::default(),
        };
        let reconciler = Reconciler::new(&gateway, Berlin, week_start());
        let templates = vec![make_template(
            "Standup",
            &[Weekday::Mon, Weekday::Wed, Weekday::Fri],
        )];

        let report = reconciler.run(&templates, &IdentityStore::new()).await;

        // Monday and Friday created, Wednesday skipped
        assert_eq!(
            report.outcomes[0].action,
            ReconcileAction::Created { occurrences: 2 }
        );
        assert_eq!(report.outcomes[0].errors.len(), 1);

        let tracked = report.store.get("Standup").unwrap();
        let draft = gateway.inner.stored(tracked).unwrap();
        assert_eq!(
            draft.start.date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
    }

    #[tokio::test]
    async fn test_duplicate_weekdays_fan_out() {
        let gateway = MockGateway::default();
        let reconciler = Reconciler::new(&gateway, Berlin, week_start());
        let templates = vec![make_template("Standup", &[Weekday::Mon, Weekday::Mon])];

        let report = reconciler.run(&templates, &IdentityStore::new()).await;

        assert_eq!(gateway.create_count(), 2);
        assert_eq!(
            report.outcomes[0].action,
            ReconcileAction::Created { occurrences: 2 }
        );
    }

    #[tokio::test]
    async fn test_update_preserves_day_and_replaces_time() {
        let gateway = MockGateway::default();
        let reconciler = Reconciler::new(&gateway, Berlin, week_start());
        let templates = vec![make_template("Standup", &[Weekday::Tue, Weekday::Thu])];

        let first = reconciler.run(&templates, &IdentityStore::new()).await;
        let tracked_id = first.store.get("Standup").unwrap().to_string();

        let mut changed = templates.clone();
        changed[0].time_of_day = "10:30".to_string();

        let second = reconciler.run(&changed, &first.store).await;

        assert_eq!(second.outcomes[0].action, ReconcileAction::Updated);
        assert_eq!(second.store.get("Standup"), Some(tracked_id.as_str()));

        let updated = gateway.stored(&tracked_id).unwrap();
        // Day kept from the existing event (the Thursday instance)...
        assert_eq!(
            updated.start.date_naive(),
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()
        );
        // ...time replaced from the template
        assert_eq!(updated.start.time().hour(), 10);
        assert_eq!(updated.start.time().minute(), 30);
    }

    #[tokio::test]
    async fn test_failed_recovery_records_no_id() {
        let gateway = MockGateway::failing_creates(&["Standup"]);
        let reconciler = Reconciler::new(&gateway, Berlin, week_start());
        let templates = vec![make_template("Standup", &[Weekday::Tue])];

        let mut store = IdentityStore::new();
        store.insert("Standup", "evt-stale");

        let report = reconciler.run(&templates, &store).await;

        assert_eq!(report.outcomes[0].action, ReconcileAction::Failed);
        assert!(report.store.is_empty());
        // Both the fetch failure and the create failure are reported
        assert_eq!(report.outcomes[0].errors.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_time_skips_template_but_not_the_run() {
        let gateway = MockGateway::default();
        let reconciler = Reconciler::new(&gateway, Berlin, week_start());

        let mut bad = make_template("Broken", &[Weekday::Mon]);
        bad.time_of_day = "noonish".to_string();
        let templates = vec![bad, make_template("Standup", &[Weekday::Tue])];

        let report = reconciler.run(&templates, &IdentityStore::new()).await;

        assert_eq!(report.outcomes[0].action, ReconcileAction::Failed);
        assert_eq!(report.store.get("Broken"), None);
        assert!(report.store.get("Standup").is_some());
        // The broken template never reached the gateway
        assert_eq!(gateway.create_count(), 1);
    }
}
