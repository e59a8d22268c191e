//! Inbound push payloads

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::deadline::parse_deadline;
use super::IngestError;
use crate::config::NotificationDefaults;
use crate::notify::{Notification, NotificationAction, NotificationOptions};
use crate::persistence::NewEvent;

/// A push payload as delivered by the host
///
/// Every field is optional. Empty strings, `false` and zero count as
/// absent, so they fall back to the configured defaults. A field of the
/// wrong JSON type is treated as absent too; it never rejects the payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PushPayload {
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub body: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub icon: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub badge: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub actions: Option<Vec<NotificationAction>>,
    #[serde(deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub require_interaction: Option<bool>,

    /// Epoch milliseconds to show on the notification
    #[serde(deserialize_with = "lenient")]
    pub timestamp: Option<f64>,

    /// The deadline to remind about
    pub last_date: Option<Value>,
}

impl PushPayload {
    /// Parse a raw payload
    ///
    /// Only bytes that are not JSON, or JSON that is not an object, are
    /// rejected.
    pub fn parse(raw: &[u8]) -> Result<Self, IngestError> {
        let value: Value =
            serde_json::from_slice(raw).map_err(|e| IngestError::PayloadInvalid(e.to_string()))?;
        Self::from_value(value)
    }

    /// Parse an already-decoded JSON value
    pub fn from_value(value: Value) -> Result<Self, IngestError> {
        if !value.is_object() {
            return Err(IngestError::PayloadInvalid(format!(
                "expected a JSON object, got {value}"
            )));
        }
        serde_json::from_value(value).map_err(|e| IngestError::PayloadInvalid(e.to_string()))
    }

    /// The arrival notification for this payload
    pub fn to_notification(&self, defaults: &NotificationDefaults, now: i64) -> Notification {
        Notification {
            title: non_empty(&self.title).unwrap_or(&defaults.arrival_title).to_string(),
            options: NotificationOptions {
                body: non_empty(&self.body).unwrap_or(&defaults.body).to_string(),
                icon: non_empty(&self.icon).unwrap_or(&defaults.icon).to_string(),
                badge: non_empty(&self.badge).unwrap_or(&defaults.badge).to_string(),
                actions: self.actions.clone().unwrap_or_default(),
                data: Some(non_empty(&self.url).unwrap_or(&defaults.url).to_string()),
                require_interaction: self.require_interaction.unwrap_or(false),
                timestamp: self
                    .timestamp
                    .filter(|t| t.is_finite() && *t != 0.0)
                    .map(|t| t.trunc() as i64)
                    .unwrap_or(now),
            },
        }
    }

    /// The pending event this payload describes
    ///
    /// Requires a parseable `lastDate`. A missing title is stored empty, so
    /// the reminder falls back to the default reminder title.
    pub fn to_event(&self) -> Result<NewEvent, IngestError> {
        let title = non_empty(&self.title).unwrap_or_default();

        let deadline = self.last_date.as_ref().unwrap_or(&Value::Null);
        let timestamp =
            parse_deadline(deadline).ok_or_else(|| IngestError::InvalidDeadline(deadline.to_string()))?;

        Ok(NewEvent::new(title, timestamp))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Decode a field, treating a value of the wrong type as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let payload = PushPayload::from_value(json!({})).unwrap();
        let n = payload.to_notification(&NotificationDefaults::default(), NOW);

        assert_eq!(n.title, "New Notification");
        assert_eq!(n.options.body, "You have a new notification.");
        assert_eq!(n.options.icon, crate::config::DEFAULT_ICON_URL);
        assert_eq!(n.options.badge, crate::config::DEFAULT_ICON_URL);
        assert!(n.options.actions.is_empty());
        assert_eq!(n.url(), Some("/"));
        assert!(!n.options.require_interaction);
        assert_eq!(n.options.timestamp, NOW);
    }

    #[test]
    fn test_payload_fields_win() {
        let payload = PushPayload::from_value(json!({
            "title": "Internship drive",
            "body": "Registrations open",
            "icon": "https://example.com/i.png",
            "badge": "https://example.com/b.png",
            "actions": [{"action": "open", "title": "Open"}],
            "url": "/drives/42",
            "requireInteraction": true,
            "timestamp": 1_600_000_000_000_i64,
            "lastDate": "2024-03-01"
        }))
        .unwrap();
        let n = payload.to_notification(&NotificationDefaults::default(), NOW);

        assert_eq!(n.title, "Internship drive");
        assert_eq!(n.options.body, "Registrations open");
        assert_eq!(n.options.icon, "https://example.com/i.png");
        assert_eq!(n.options.badge, "https://example.com/b.png");
        assert_eq!(n.options.actions.len(), 1);
        assert_eq!(n.url(), Some("/drives/42"));
        assert!(n.options.require_interaction);
        assert_eq!(n.options.timestamp, 1_600_000_000_000);
    }

    #[test]
    fn test_empty_strings_fall_back() {
        let payload = PushPayload::from_value(json!({"title": "", "body": "", "url": ""})).unwrap();
        let n = payload.to_notification(&NotificationDefaults::default(), NOW);

        assert_eq!(n.title, "New Notification");
        assert_eq!(n.options.body, "You have a new notification.");
        assert_eq!(n.url(), Some("/"));
    }

    #[test]
    fn test_to_event() {
        let payload =
            PushPayload::from_value(json!({"title": "Apply Now", "lastDate": "2024-03-01"})).unwrap();

        assert_eq!(
            payload.to_event().unwrap(),
            NewEvent::new("Apply Now", 1_709_251_200_000)
        );
    }

    #[test]
    fn test_to_event_rejects_bad_deadline() {
        let payload =
            PushPayload::from_value(json!({"title": "Apply Now", "lastDate": "whenever"})).unwrap();
        assert!(matches!(
            payload.to_event(),
            Err(IngestError::InvalidDeadline(_))
        ));

        let payload = PushPayload::from_value(json!({"title": "Apply Now"})).unwrap();
        assert!(matches!(
            payload.to_event(),
            Err(IngestError::InvalidDeadline(_))
        ));
    }

    #[test]
    fn test_to_event_without_title_stores_empty_title() {
        let payload = PushPayload::from_value(json!({"lastDate": "2024-03-01"})).unwrap();
        assert_eq!(payload.to_event().unwrap(), NewEvent::new("", 1_709_251_200_000));

        let payload =
            PushPayload::from_value(json!({"title": "   ", "lastDate": "2024-03-01"})).unwrap();
        assert_eq!(payload.to_event().unwrap().title, "");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(PushPayload::parse(b"{not json").is_err());
        assert!(PushPayload::parse(b"null").is_err());
        assert!(PushPayload::parse(b"[]").is_err());
        assert!(PushPayload::parse(br#""text""#).is_err());
        assert!(PushPayload::parse(br#"{"title": "ok"}"#).is_ok());
    }

    #[test]
    fn test_wrong_field_types_fall_back() {
        let defaults = NotificationDefaults::default();
        let cases = [
            json!({"requireInteraction": "true"}),
            json!({"timestamp": "1700000000000"}),
            json!({"body": 5}),
            json!({"icon": false, "badge": [1]}),
            json!({"actions": "nope"}),
            json!({"url": {"path": "/x"}}),
        ];

        for extra in cases {
            let mut value = json!({"title": "Apply Now", "lastDate": "2030-01-01"});
            for (k, v) in extra.as_object().unwrap() {
                value[k] = v.clone();
            }
            let raw = serde_json::to_vec(&value).unwrap();

            let payload = PushPayload::parse(&raw).unwrap();
            let n = payload.to_notification(&defaults, NOW);
            assert_eq!(n.title, "Apply Now", "payload {value}");
            assert_eq!(n.options.body, defaults.body, "payload {value}");
            assert_eq!(n.options.icon, defaults.icon, "payload {value}");
            assert_eq!(n.options.badge, defaults.badge, "payload {value}");
            assert!(n.options.actions.is_empty(), "payload {value}");
            assert_eq!(n.url(), Some("/"), "payload {value}");
            assert!(!n.options.require_interaction, "payload {value}");
            assert_eq!(n.options.timestamp, NOW, "payload {value}");
            assert!(payload.to_event().is_ok(), "payload {value}");
        }
    }

    #[test]
    fn test_wrong_title_type_uses_arrival_title() {
        let payload = PushPayload::parse(br#"{"title": 42, "lastDate": "2024-03-01"}"#).unwrap();

        let n = payload.to_notification(&NotificationDefaults::default(), NOW);
        assert_eq!(n.title, "New Notification");
        assert_eq!(payload.to_event().unwrap().title, "");
    }
}
