//! Host capabilities backed by commands written to stdout

use async_trait::async_trait;
use duewatch_scheduler::{
    ClientSurface, ClientSurfaces, DisplayError, InteractionError, Notification, Notifier,
};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::protocol::HostCommand;

/// Sending side of the command stream
///
/// Every clone feeds the same writer. The writer finishes once all clones are
/// dropped.
///
/// The protocol has no acknowledgement, so as a [`Notifier`] a display
/// succeeds once its `show_notification` command is queued. A due event is
/// then retired even if the host later fails to show it. Only a closed
/// command stream is reported as a [`DisplayError`].
#[derive(Clone)]
pub struct HostBridge {
    tx: mpsc::UnboundedSender<HostCommand>,
}

impl HostBridge {
    /// Create a bridge and the receiver its commands arrive on
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a command for the host
    pub fn send(&self, command: HostCommand) -> Result<(), BridgeClosed> {
        self.tx.send(command).map_err(|_| BridgeClosed)
    }
}

/// The command writer has stopped
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("host command channel is closed")]
pub struct BridgeClosed;

#[async_trait]
impl Notifier for HostBridge {
    async fn show_notification(&self, notification: &Notification) -> Result<(), DisplayError> {
        self.send(HostCommand::ShowNotification {
            notification: notification.clone(),
        })
        .map_err(|e| DisplayError(e.to_string()))
    }

    async fn close_notification(&self, notification: &Notification) -> Result<(), DisplayError> {
        self.send(HostCommand::CloseNotification {
            notification: notification.clone(),
        })
        .map_err(|e| DisplayError(e.to_string()))
    }
}

/// Client surfaces as reported with one click
pub struct BridgeClients {
    clients: Vec<ClientSurface>,
    bridge: HostBridge,
}

impl BridgeClients {
    pub fn new(clients: Vec<ClientSurface>, bridge: HostBridge) -> Self {
        Self { clients, bridge }
    }
}

#[async_trait]
impl ClientSurfaces for BridgeClients {
    async fn match_all(&self) -> Result<Vec<ClientSurface>, InteractionError> {
        Ok(self.clients.clone())
    }

    async fn focus(&self, id: &str) -> Result<(), InteractionError> {
        self.bridge
            .send(HostCommand::FocusClient { id: id.to_string() })
            .map_err(|e| InteractionError::Surfaces(e.to_string()))
    }

    async fn open_window(&self, url: &str) -> Result<(), InteractionError> {
        self.bridge
            .send(HostCommand::OpenWindow {
                url: url.to_string(),
            })
            .map_err(|e| InteractionError::Surfaces(e.to_string()))
    }
}

/// Write commands as JSON lines until every bridge is dropped
///
/// Returns the number of commands written.
pub async fn write_commands<W>(
    mut rx: mpsc::UnboundedReceiver<HostCommand>,
    writer: &mut W,
) -> std::io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while let Some(command) = rx.recv().await {
        let json = match serde_json::to_string(&command) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to serialize host command; skipping");
                continue;
            }
        };
        write_line(writer, &json).await?;
        written += 1;
    }
    debug!(written, "command stream closed");
    Ok(written)
}

async fn write_line<W>(writer: &mut W, json: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use duewatch_scheduler::NotificationOptions;

    fn notification(title: &str) -> Notification {
        Notification {
            title: title.to_string(),
            options: NotificationOptions {
                data: Some("/jobs".to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_commands_are_written_as_lines() {
        let (bridge, rx) = HostBridge::channel();
        bridge.show_notification(&notification("Apply Now")).await.unwrap();
        bridge.close_notification(&notification("Apply Now")).await.unwrap();
        drop(bridge);

        let mut out = Vec::new();
        let written = write_commands(rx, &mut out).await.unwrap();

        assert_eq!(written, 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<HostCommand> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(
            lines[0],
            HostCommand::ShowNotification {
                notification: notification("Apply Now")
            }
        );
        assert!(matches!(lines[1], HostCommand::CloseNotification { .. }));
    }

    #[tokio::test]
    async fn test_show_fails_once_writer_is_gone() {
        let (bridge, rx) = HostBridge::channel();
        drop(rx);

        let err = bridge
            .show_notification(&notification("late"))
            .await
            .unwrap_err();
        assert!(err.0.contains("closed"));
    }

    #[tokio::test]
    async fn test_client_surfaces_emit_commands() {
        let (bridge, mut rx) = HostBridge::channel();
        let clients = BridgeClients::new(
            vec![ClientSurface {
                id: "tab-1".to_string(),
                url: "https://app.example.com/".to_string(),
                focused: false,
            }],
            bridge,
        );

        assert_eq!(clients.match_all().await.unwrap().len(), 1);
        clients.focus("tab-1").await.unwrap();
        clients.open_window("/apply").await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(HostCommand::FocusClient {
                id: "tab-1".to_string()
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(HostCommand::OpenWindow {
                url: "/apply".to_string()
            })
        );
    }
}
