//! Newline-delimited JSON protocol spoken with the host
//!
//! The host writes one [`HostMessage`] per line to the worker's stdin and
//! reads one [`HostCommand`] per line from its stdout.

use duewatch_scheduler::{ClientSurface, Notification};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Something the host tells the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// A push message arrived; `data` is its payload, if any
    Push {
        #[serde(default)]
        data: Option<Value>,
    },

    /// A periodic background sync fired
    PeriodicSync { tag: String },

    /// The user clicked a notification
    NotificationClick {
        notification: Notification,
        #[serde(default)]
        clients: Vec<ClientSurface>,
    },
}

impl HostMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Push { .. } => "push",
            Self::PeriodicSync { .. } => "periodic_sync",
            Self::NotificationClick { .. } => "notification_click",
        }
    }
}

/// Something the worker asks the host to do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostCommand {
    ShowNotification { notification: Notification },
    CloseNotification { notification: Notification },
    FocusClient { id: String },
    OpenWindow { url: String },
    RegisterPeriodicSync { tag: String, min_interval_ms: u64 },
}

/// Raw payload bytes for a push message's `data`
///
/// A JSON string is the payload text itself; any other value is the payload
/// already decoded by the host.
pub fn push_bytes(data: &Value) -> Vec<u8> {
    match data {
        Value::String(text) => text.clone().into_bytes(),
        other => other.to_string().into_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_push_with_and_without_data() {
        let msg: HostMessage =
            serde_json::from_str(r#"{"type":"push","data":{"title":"Apply Now"}}"#).unwrap();
        assert_eq!(
            msg,
            HostMessage::Push {
                data: Some(json!({"title": "Apply Now"}))
            }
        );

        let msg: HostMessage = serde_json::from_str(r#"{"type":"push"}"#).unwrap();
        assert_eq!(msg, HostMessage::Push { data: None });

        let msg: HostMessage = serde_json::from_str(r#"{"type":"push","data":null}"#).unwrap();
        assert_eq!(msg, HostMessage::Push { data: None });
    }

    #[test]
    fn test_decodes_click_without_clients() {
        let msg: HostMessage = serde_json::from_str(
            r#"{"type":"notification_click","notification":{"title":"Apply Now"}}"#,
        )
        .unwrap();

        match msg {
            HostMessage::NotificationClick {
                notification,
                clients,
            } => {
                assert_eq!(notification.title, "Apply Now");
                assert!(clients.is_empty());
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_json::from_str::<HostMessage>(r#"{"type":"fetch"}"#).is_err());
    }

    #[test]
    fn test_command_wire_shape() {
        let json = serde_json::to_value(HostCommand::RegisterPeriodicSync {
            tag: "check-events".to_string(),
            min_interval_ms: 3_600_000,
        })
        .unwrap();

        assert_eq!(
            json,
            json!({"type": "register_periodic_sync", "tag": "check-events", "min_interval_ms": 3_600_000})
        );
    }

    #[test]
    fn test_push_bytes() {
        assert_eq!(push_bytes(&json!("{\"title\":\"a\"}")), br#"{"title":"a"}"#.to_vec());
        assert_eq!(push_bytes(&json!({"title": "a"})), br#"{"title":"a"}"#.to_vec());
    }
}
