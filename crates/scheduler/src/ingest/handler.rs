//! Push payload ingestion

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use super::payload::PushPayload;
use crate::notify::NotificationDispatcher;
use crate::persistence::{EventId, EventStore, NewEvent, StoreError};

/// What an ingest did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Id of the stored event, if one was persisted
    pub persisted: Option<EventId>,

    /// Whether the arrival notification was shown
    pub displayed: bool,
}

/// Persists pushed deadlines and shows an arrival notification
///
/// Persistence and display are independent: a payload whose deadline cannot
/// be stored is still displayed, and a display failure does not undo the
/// stored event.
pub struct IngestHandler {
    store: Arc<dyn EventStore>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl IngestHandler {
    pub fn new(store: Arc<dyn EventStore>, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Handle a raw payload delivery against the wall clock
    ///
    /// Returns `None` when the payload is absent or unparseable. Never fails.
    pub async fn handle(&self, raw: Option<&[u8]>) -> Option<IngestOutcome> {
        self.handle_at(raw, Utc::now().timestamp_millis()).await
    }

    /// Handle a raw payload delivery with a fixed `now`
    pub async fn handle_at(&self, raw: Option<&[u8]>, now: i64) -> Option<IngestOutcome> {
        let Some(raw) = raw else {
            debug!("push without payload, nothing to do");
            return None;
        };

        match PushPayload::parse(raw) {
            Ok(payload) => Some(self.ingest(&payload, now).await),
            Err(e) => {
                warn!(error = %e, "dropping push payload");
                None
            }
        }
    }

    /// Ingest a parsed payload
    #[instrument(skip(self, payload), fields(title = ?payload.title))]
    pub async fn ingest(&self, payload: &PushPayload, now: i64) -> IngestOutcome {
        let notification = payload.to_notification(self.dispatcher.defaults(), now);

        let persisted = match payload.to_event() {
            Ok(event) => match self.persist(event).await {
                Ok(id) => {
                    info!(event_id = id, "stored pushed event");
                    Some(id)
                }
                Err(e) => {
                    error!(error = %e, "failed to store pushed event");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "push payload not stored");
                None
            }
        };

        let displayed = match self.dispatcher.display_immediate(&notification).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "failed to display arrival notification");
                false
            }
        };

        IngestOutcome {
            persisted,
            displayed,
        }
    }

    async fn persist(&self, event: NewEvent) -> Result<EventId, StoreError> {
        self.store.open().await?;
        self.store.insert(event).await
    }
}
