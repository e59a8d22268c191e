//! Notification click handling
//!
//! On a click the notification is closed, then the user is brought to an
//! existing client surface if there is one, or a new one is opened at the
//! notification's URL.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use crate::notify::{DisplayError, Notification, Notifier};

/// An open client window or tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSurface {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub focused: bool,
}

/// Interaction errors
#[derive(Debug, thiserror::Error)]
pub enum InteractionError {
    /// The host could not list, focus or open client surfaces
    #[error("client surfaces: {0}")]
    Surfaces(String),

    #[error(transparent)]
    Notifier(#[from] DisplayError),
}

/// Host user-interaction surface
#[async_trait]
pub trait ClientSurfaces: Send + Sync {
    /// Every open client surface, including uncontrolled ones
    async fn match_all(&self) -> Result<Vec<ClientSurface>, InteractionError>;

    async fn focus(&self, id: &str) -> Result<(), InteractionError>;

    async fn open_window(&self, url: &str) -> Result<(), InteractionError>;
}

/// What a click resulted in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// An existing surface was focused
    Focused(String),
    /// A new surface was opened at this URL
    Opened(String),
}

/// Reacts to notification clicks
pub struct InteractionHandler {
    notifier: Arc<dyn Notifier>,
    default_url: String,
}

impl InteractionHandler {
    pub fn new(notifier: Arc<dyn Notifier>, default_url: impl Into<String>) -> Self {
        Self {
            notifier,
            default_url: default_url.into(),
        }
    }

    /// Handle a click, logging and swallowing failures
    pub async fn on_click(
        &self,
        notification: &Notification,
        surfaces: &dyn ClientSurfaces,
    ) -> Option<ClickOutcome> {
        match self.handle_click(notification, surfaces).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(error = %e, "failed to handle notification click");
                None
            }
        }
    }

    /// Close the notification, then focus or open a client surface
    #[instrument(skip_all, fields(title = %notification.title))]
    pub async fn handle_click(
        &self,
        notification: &Notification,
        surfaces: &dyn ClientSurfaces,
    ) -> Result<ClickOutcome, InteractionError> {
        if let Err(e) = self.notifier.close_notification(notification).await {
            warn!(error = %e, "failed to close clicked notification");
        }

        let clients = surfaces.match_all().await?;
        let target = clients
            .iter()
            .find(|c| c.focused)
            .or_else(|| clients.first());

        match target {
            Some(client) => {
                debug!(client_id = %client.id, "focusing client");
                surfaces.focus(&client.id).await?;
                Ok(ClickOutcome::Focused(client.id.clone()))
            }
            None => {
                let url = notification.url().unwrap_or(&self.default_url);
                debug!(%url, "no open clients, opening window");
                surfaces.open_window(url).await?;
                Ok(ClickOutcome::Opened(url.to_string()))
            }
        }
    }
}

/// Client surfaces held in memory, recording focus and open calls
#[derive(Default)]
pub struct InMemoryClientSurfaces {
    clients: Mutex<Vec<ClientSurface>>,
    focused: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
}

impl InMemoryClientSurfaces {
    pub fn new(clients: Vec<ClientSurface>) -> Self {
        Self {
            clients: Mutex::new(clients),
            ..Default::default()
        }
    }

    /// Ids passed to `focus`, in order
    pub fn focused(&self) -> Vec<String> {
        self.focused.lock().clone()
    }

    /// URLs passed to `open_window`, in order
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl ClientSurfaces for InMemoryClientSurfaces {
    async fn match_all(&self) -> Result<Vec<ClientSurface>, InteractionError> {
        Ok(self.clients.lock().clone())
    }

    async fn focus(&self, id: &str) -> Result<(), InteractionError> {
        let mut clients = self.clients.lock();
        if !clients.iter().any(|c| c.id == id) {
            return Err(InteractionError::Surfaces(format!("no client with id {id}")));
        }
        for client in clients.iter_mut() {
            client.focused = client.id == id;
        }
        self.focused.lock().push(id.to_string());
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<(), InteractionError> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{InMemoryNotifier, NotificationOptions};

    fn client(id: &str, focused: bool) -> ClientSurface {
        ClientSurface {
            id: id.to_string(),
            url: format!("https://app.example.com/{id}"),
            focused,
        }
    }

    fn clicked(url: Option<&str>) -> Notification {
        Notification {
            title: "Apply Now".to_string(),
            options: NotificationOptions {
                body: String::new(),
                icon: String::new(),
                badge: String::new(),
                actions: vec![],
                data: url.map(str::to_string),
                require_interaction: false,
                timestamp: 0,
            },
        }
    }

    fn handler() -> (Arc<InMemoryNotifier>, InteractionHandler) {
        let notifier = Arc::new(InMemoryNotifier::new());
        (notifier.clone(), InteractionHandler::new(notifier, "/"))
    }

    #[tokio::test]
    async fn test_focuses_the_focused_client() {
        let (notifier, handler) = handler();
        let surfaces = InMemoryClientSurfaces::new(vec![client("a", false), client("b", true)]);

        let outcome = handler
            .handle_click(&clicked(Some("/jobs")), &surfaces)
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::Focused("b".to_string()));
        assert_eq!(surfaces.focused(), vec!["b".to_string()]);
        assert!(surfaces.opened().is_empty());
        assert_eq!(notifier.closed().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_first_client() {
        let (_notifier, handler) = handler();
        let surfaces = InMemoryClientSurfaces::new(vec![client("a", false), client("b", false)]);

        let outcome = handler
            .handle_click(&clicked(Some("/jobs")), &surfaces)
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::Focused("a".to_string()));
        assert!(surfaces.opened().is_empty());
    }

    #[tokio::test]
    async fn test_opens_window_when_no_clients() {
        let (notifier, handler) = handler();
        let surfaces = InMemoryClientSurfaces::default();

        let outcome = handler
            .handle_click(&clicked(Some("/jobs/7")), &surfaces)
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::Opened("/jobs/7".to_string()));
        assert_eq!(surfaces.opened(), vec!["/jobs/7".to_string()]);
        assert_eq!(notifier.closed().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_url_opens_default() {
        let (_notifier, handler) = handler();
        let surfaces = InMemoryClientSurfaces::default();

        let outcome = handler.on_click(&clicked(None), &surfaces).await;

        assert_eq!(outcome, Some(ClickOutcome::Opened("/".to_string())));
    }
}
