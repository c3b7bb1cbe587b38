//! The remote calendar surface the engine drives.

use async_trait::async_trait;

use crate::error::WeekSyncResult;
use crate::event::{EventDraft, RemoteEvent};

/// A remote calendar holding one event per materialized occurrence.
///
/// Every operation may fail for transient or permanent reasons. The engine
/// never assumes idempotency from the gateway itself; recovery happens at
/// the reconciliation layer, keyed off the identity store.
#[async_trait]
pub trait CalendarGateway {
    /// Create a new event, returning the remote-assigned id.
    async fn create_event(&self, draft: &EventDraft) -> WeekSyncResult<String>;

    /// Fetch a single event by id.
    async fn get_event(&self, event_id: &str) -> WeekSyncResult<RemoteEvent>;

    /// Overwrite the event with `event_id` wholesale.
    async fn update_event(&self, event_id: &str, draft: &EventDraft) -> WeekSyncResult<()>;

    /// Delete the event with `event_id`.
    async fn delete_event(&self, event_id: &str) -> WeekSyncResult<()>;
}
