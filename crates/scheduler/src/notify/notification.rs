//! Notification content handed to the host display capability

use serde::{Deserialize, Serialize};

/// A button attached to a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Display options, mirroring the host's `showNotification` options
///
/// Fields missing from host-echoed notifications decode to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub actions: Vec<NotificationAction>,

    /// URL to open when the notification is clicked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    pub require_interaction: bool,

    /// Epoch milliseconds shown alongside the notification
    pub timestamp: i64,
}

/// A notification ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    #[serde(default)]
    pub options: NotificationOptions,
}

impl Notification {
    /// Target URL carried in `data`, if any
    pub fn url(&self) -> Option<&str> {
        self.options.data.as_deref()
    }
}
