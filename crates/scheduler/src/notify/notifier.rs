//! Host display capability

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::notification::Notification;

/// The host refused or could not show a notification
#[derive(Debug, Clone, thiserror::Error)]
#[error("display failed: {0}")]
pub struct DisplayError(pub String);

/// Host notification-display facility
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Show a notification
    async fn show_notification(&self, notification: &Notification) -> Result<(), DisplayError>;

    /// Dismiss a previously shown notification
    async fn close_notification(&self, _notification: &Notification) -> Result<(), DisplayError> {
        Ok(())
    }
}

/// Recording notifier for tests
///
/// Every display call yields to the scheduler first, like a real host call
/// would, so concurrent passes interleave at this point.
#[derive(Default)]
pub struct InMemoryNotifier {
    shown: Mutex<Vec<Notification>>,
    closed: Mutex<Vec<Notification>>,
    fail_all: AtomicBool,
    fail_titles: Mutex<HashSet<String>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent display call fail
    pub fn fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Make display calls for this title fail
    pub fn fail_title(&self, title: impl Into<String>) {
        self.fail_titles.lock().insert(title.into());
    }

    /// Notifications shown so far, in order
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().clone()
    }

    /// Titles of notifications shown so far, in order
    pub fn shown_titles(&self) -> Vec<String> {
        self.shown.lock().iter().map(|n| n.title.clone()).collect()
    }

    pub fn shown_count(&self) -> usize {
        self.shown.lock().len()
    }

    /// Notifications closed so far, in order
    pub fn closed(&self) -> Vec<Notification> {
        self.closed.lock().clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn show_notification(&self, notification: &Notification) -> Result<(), DisplayError> {
        tokio::task::yield_now().await;

        if self.fail_all.load(Ordering::SeqCst)
            || self.fail_titles.lock().contains(&notification.title)
        {
            return Err(DisplayError(format!(
                "host rejected notification '{}'",
                notification.title
            )));
        }

        self.shown.lock().push(notification.clone());
        Ok(())
    }

    async fn close_notification(&self, notification: &Notification) -> Result<(), DisplayError> {
        self.closed.lock().push(notification.clone());
        Ok(())
    }
}
