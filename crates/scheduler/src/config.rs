//! Scheduler configuration
//!
//! Loaded from environment variables by the worker, or built directly with
//! the `with_*` builder methods in tests and embedders.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::due::DEFAULT_WINDOW;

/// Tag the host delivers with periodic wake signals
pub const DEFAULT_WAKE_TAG: &str = "check-events";

/// Longest accepted window or cadence (one year)
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Icon and badge used when a payload carries none
pub const DEFAULT_ICON_URL: &str = "https://upload.wikimedia.org/wikipedia/en/thumb/e/e9/Netaji_Subhas_University_of_Technology.svg/1200px-Netaji_Subhas_University_of_Technology.svg.png";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// What a reconciliation pass does with events whose deadline has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PastDuePolicy {
    /// Leave past-due events untouched: no notification, no delete
    #[default]
    Retain,

    /// Delete past-due events without notifying
    Discard,
}

impl std::str::FromStr for PastDuePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(Self::Retain),
            "discard" => Ok(Self::Discard),
            other => Err(format!("expected 'retain' or 'discard', got '{other}'")),
        }
    }
}

impl std::fmt::Display for PastDuePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retain => write!(f, "retain"),
            Self::Discard => write!(f, "discard"),
        }
    }
}

/// Fallback values for every optional notification field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDefaults {
    /// Title for an ingested payload without one
    pub arrival_title: String,

    /// Title for a reminder whose event has a blank title
    pub reminder_title: String,

    pub body: String,
    pub icon: String,
    pub badge: String,
    pub url: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            arrival_title: "New Notification".to_string(),
            reminder_title: "Upcoming Event!".to_string(),
            body: "You have a new notification.".to_string(),
            icon: DEFAULT_ICON_URL.to_string(),
            badge: DEFAULT_ICON_URL.to_string(),
            url: "/".to_string(),
        }
    }
}

impl NotificationDefaults {
    /// Use one URL for both icon and badge
    pub fn with_icon(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.icon = url.clone();
        self.badge = url;
        self
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Lead time before a deadline during which an event is due
    #[serde(with = "duration_millis")]
    pub window: Duration,

    /// Interval between timer-driven reconciliation passes
    #[serde(with = "duration_millis")]
    pub cadence: Duration,

    /// Wake signal tag that triggers a pass
    pub wake_tag: String,

    pub past_due: PastDuePolicy,

    pub defaults: NotificationDefaults,

    /// SQLite URL; the in-memory store is used when absent
    pub database_url: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            cadence: DEFAULT_WINDOW,
            wake_tag: DEFAULT_WAKE_TAG.to_string(),
            past_due: PastDuePolicy::default(),
            defaults: NotificationDefaults::default(),
            database_url: None,
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `DUEWATCH_WINDOW_SECS`: notification window (default: 3600)
    /// - `DUEWATCH_CADENCE_SECS`: timer cadence (default: the window)
    /// - `DUEWATCH_WAKE_TAG`: wake signal tag (default: "check-events")
    /// - `DUEWATCH_PAST_DUE`: "retain" or "discard" (default: "retain")
    /// - `DUEWATCH_ICON_URL`: default icon and badge
    /// - `DATABASE_URL`: SQLite URL
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_secs(&lookup, "DUEWATCH_WINDOW_SECS")? {
            config.window = secs;
            config.cadence = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "DUEWATCH_CADENCE_SECS")? {
            config.cadence = secs;
        }
        if let Some(tag) = lookup("DUEWATCH_WAKE_TAG").filter(|t| !t.trim().is_empty()) {
            config.wake_tag = tag;
        }
        if let Some(value) = lookup("DUEWATCH_PAST_DUE") {
            config.past_due = value
                .parse()
                .map_err(|reason| ConfigError::InvalidValue {
                    name: "DUEWATCH_PAST_DUE",
                    value,
                    reason,
                })?;
        }
        if let Some(url) = lookup("DUEWATCH_ICON_URL").filter(|u| !u.is_empty()) {
            config.defaults = config.defaults.with_icon(url);
        }
        config.database_url = lookup("DATABASE_URL").filter(|u| !u.is_empty());

        Ok(config)
    }

    /// Set the notification window
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the timer cadence
    pub fn with_cadence(mut self, cadence: Duration) -> Self {
        self.cadence = cadence;
        self
    }

    /// Set the wake signal tag
    pub fn with_wake_tag(mut self, tag: impl Into<String>) -> Self {
        self.wake_tag = tag.into();
        self
    }

    /// Set the past-due policy
    pub fn with_past_due_policy(mut self, policy: PastDuePolicy) -> Self {
        self.past_due = policy;
        self
    }

    /// Set notification defaults
    pub fn with_defaults(mut self, defaults: NotificationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Set the database URL
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }
}

fn parse_secs<F>(lookup: &F, name: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(name) else {
        return Ok(None);
    };

    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            name,
            value,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) if secs > MAX_INTERVAL.as_secs() => Err(ConfigError::InvalidValue {
            name,
            value,
            reason: format!("must be at most {} seconds", MAX_INTERVAL.as_secs()),
        }),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        Err(e) => Err(ConfigError::InvalidValue {
            name,
            value,
            reason: e.to_string(),
        }),
    }
}

/// Serde support for Duration as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
