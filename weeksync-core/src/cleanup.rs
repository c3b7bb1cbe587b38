//! Bulk deletion of tracked events.

use std::time::Duration;

use crate::gateway::CalendarGateway;
use crate::store::IdentityStore;

/// Result of a bulk cleanup pass.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Titles whose tracked event was deleted.
    pub deleted: Vec<String>,
    /// Titles whose delete failed, with the error text.
    pub failed: Vec<(String, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delete every event recorded in `store`, tolerating individual failures
/// (an already-deleted remote event is not worth aborting a wipe for).
///
/// The store itself is left untouched; a follow-up reconciliation rebuilds
/// it from scratch. `settle` is slept after the deletes so the remote can
/// observe them before anything is recreated on top; pass zero when no
/// creation follows.
pub async fn delete_tracked_events<G: CalendarGateway>(
    gateway: &G,
    store: &IdentityStore,
    settle: Duration,
) -> CleanupReport {
    let mut report = CleanupReport::default();

    for (title, event_id) in store.entries() {
        match gateway.delete_event(event_id).await {
            Ok(()) => report.deleted.push(title.to_string()),
            Err(e) => report.failed.push((title.to_string(), e.to_string())),
        }
    }

    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    report
}
