//! Notification dispatch and event retirement

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use super::notification::{Notification, NotificationOptions};
use super::notifier::{DisplayError, Notifier};
use crate::config::NotificationDefaults;
use crate::persistence::{Event, EventId, EventStore, StoreError};

/// Dispatch errors
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Nothing was shown; a stored event is kept for a later pass
    #[error(transparent)]
    Display(#[from] DisplayError),

    /// The notification was shown but the event could not be deleted
    #[error("notification shown but event {id} was not retired: {source}")]
    Retire {
        id: EventId,
        #[source]
        source: StoreError,
    },
}

/// Turns events and payloads into displayed notifications
///
/// Stored events are retired with display-then-delete ordering: a failed
/// display leaves the event in place, and a failed delete can at worst
/// cause one more notification on the next pass.
pub struct NotificationDispatcher {
    store: Arc<dyn EventStore>,
    notifier: Arc<dyn Notifier>,
    defaults: NotificationDefaults,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn EventStore>,
        notifier: Arc<dyn Notifier>,
        defaults: NotificationDefaults,
    ) -> Self {
        Self {
            store,
            notifier,
            defaults,
        }
    }

    pub fn defaults(&self) -> &NotificationDefaults {
        &self.defaults
    }

    /// Show a notification for a freshly ingested payload
    #[instrument(skip(self, notification), fields(title = %notification.title))]
    pub async fn display_immediate(&self, notification: &Notification) -> Result<(), DispatchError> {
        self.notifier.show_notification(notification).await?;
        debug!("displayed arrival notification");
        Ok(())
    }

    /// Show the reminder for a due event, then delete it from the store
    #[instrument(skip(self, event), fields(event_id = event.id))]
    pub async fn display_and_retire(&self, event: &Event) -> Result<(), DispatchError> {
        let notification = self.reminder_for(event);
        self.notifier.show_notification(&notification).await?;

        if let Err(source) = self.store.delete_by_id(event.id).await {
            warn!(error = %source, "reminder shown but event not retired");
            return Err(DispatchError::Retire {
                id: event.id,
                source,
            });
        }

        debug!("reminder displayed and event retired");
        Ok(())
    }

    /// Build the reminder notification for a stored event
    pub fn reminder_for(&self, event: &Event) -> Notification {
        let title = if event.title.trim().is_empty() {
            self.defaults.reminder_title.clone()
        } else {
            event.title.clone()
        };

        Notification {
            options: NotificationOptions {
                body: format!("Last minutes to apply in \"{title}\"."),
                icon: self.defaults.icon.clone(),
                badge: self.defaults.badge.clone(),
                actions: vec![],
                data: None,
                require_interaction: false,
                timestamp: event.timestamp,
            },
            title,
        }
    }
}
