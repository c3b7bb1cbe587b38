//! Google Calendar API client and gateway implementation.

use anyhow::Result;
use async_trait::async_trait;
use google_calendar::types::SendUpdates;
use google_calendar::Client;
use weeksync_core::{CalendarGateway, EventDraft, RemoteEvent, WeekSyncError, WeekSyncResult};

use super::auth::get_valid_tokens;
use super::config::{self, AccountTokens, GoogleCredentials};
use super::convert::{to_google_event, to_remote_event};

pub const REDIRECT_PORT: u16 = 8085;
pub const REDIRECT_URI: &str = "http://localhost:8085/callback";

/// Create a Google Calendar client from stored tokens.
pub fn create_client(creds: &GoogleCredentials, tokens: &AccountTokens) -> Client {
    Client::new(
        creds.client_id.clone(),
        creds.client_secret.clone(),
        REDIRECT_URI.to_string(),
        tokens.access_token.clone(),
        tokens.refresh_token.clone(),
    )
}

/// Create a client for the initial consent flow (no tokens yet).
pub fn create_auth_client(creds: &GoogleCredentials) -> Client {
    Client::new(
        creds.client_id.clone(),
        creds.client_secret.clone(),
        REDIRECT_URI.to_string(),
        String::new(),
        String::new(),
    )
}

/// The engine's gateway to one Google calendar.
pub struct GoogleGateway {
    client: Client,
    calendar_id: String,
}

impl GoogleGateway {
    /// Build a gateway for `account`, refreshing tokens if needed.
    pub async fn connect(account: &str, calendar_id: &str) -> Result<Self> {
        let creds = config::load_credentials()?;
        let tokens = get_valid_tokens(account).await?;

        Ok(GoogleGateway {
            client: create_client(&creds, &tokens),
            calendar_id: calendar_id.to_string(),
        })
    }
}

#[async_trait]
impl CalendarGateway for GoogleGateway {
    async fn create_event(&self, draft: &EventDraft) -> WeekSyncResult<String> {
        let mut google_event = to_google_event(draft);
        // Let Google assign the ID
        // (Otherwise we'll get "Invalid resource id value")
        google_event.id = String::new();

        let response = self
            .client
            .events()
            .insert(
                &self.calendar_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &google_event,
            )
            .await
            .map_err(|e| {
                WeekSyncError::Gateway(format!(
                    "Failed to create event '{}': {}",
                    draft.summary, e
                ))
            })?;

        Ok(response.body.id)
    }

    async fn get_event(&self, event_id: &str) -> WeekSyncResult<RemoteEvent> {
        let response = self
            .client
            .events()
            .get(&self.calendar_id, event_id, 0, "")
            .await
            .map_err(|e| {
                WeekSyncError::Gateway(format!("Failed to fetch event {}: {}", event_id, e))
            })?;

        Ok(to_remote_event(response.body))
    }

    async fn update_event(&self, event_id: &str, draft: &EventDraft) -> WeekSyncResult<()> {
        let mut google_event = to_google_event(draft);
        google_event.id = event_id.to_string();

        self.client
            .events()
            .update(
                &self.calendar_id,
                event_id,
                0,
                0,
                false,
                SendUpdates::None,
                false,
                &google_event,
            )
            .await
            .map_err(|e| {
                WeekSyncError::Gateway(format!(
                    "Failed to update event '{}': {}",
                    draft.summary, e
                ))
            })?;

        Ok(())
    }

    async fn delete_event(&self, event_id: &str) -> WeekSyncResult<()> {
        let result = self
            .client
            .events()
            .delete(&self.calendar_id, event_id, false, SendUpdates::None)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let error_str = e.to_string();
                // An event that is already gone remotely is as deleted as
                // it gets
                if error_str.contains("410") || error_str.contains("Gone") {
                    Ok(())
                } else {
                    Err(WeekSyncError::Gateway(format!(
                        "Failed to delete event {}: {}",
                        event_id, e
                    )))
                }
            }
        }
    }
}
