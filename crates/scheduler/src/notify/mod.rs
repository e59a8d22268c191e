//! Notification display and dispatch
//!
//! This module provides:
//! - [`Notification`] content in the host's `showNotification` shape
//! - [`Notifier`] trait for the host display capability
//! - [`NotificationDispatcher`] for immediate display and display-then-retire

mod dispatcher;
mod notification;
mod notifier;

pub use dispatcher::{DispatchError, NotificationDispatcher};
pub use notification::{Notification, NotificationAction, NotificationOptions};
pub use notifier::{DisplayError, InMemoryNotifier, Notifier};
