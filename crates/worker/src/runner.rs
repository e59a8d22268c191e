//! Stdio bridge runner
//!
//! Reads host messages line by line, routes each to the scheduler, and
//! streams the resulting host commands back out. Runs until the input closes
//! or shutdown is triggered, then stops the reconciliation loop and lets its
//! in-flight passes finish before the command stream is closed.

use std::sync::Arc;

use duewatch_scheduler::{EventStore, LoopHandle, NotificationService, SchedulerConfig, WakeSignal};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::bridge::{write_commands, BridgeClients, HostBridge};
use crate::protocol::{push_bytes, HostCommand, HostMessage};

/// What a bridge run handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeSummary {
    /// Host messages decoded and routed
    pub messages: usize,
    /// Input lines that were not a valid host message
    pub malformed: usize,
    /// Reconciliation passes that finished
    pub passes: usize,
    /// Commands written to the host
    pub commands: usize,
}

/// Stops a running bridge from outside, e.g. on Ctrl-C
#[derive(Clone)]
pub struct ShutdownTrigger(Arc<watch::Sender<bool>>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.0.send(true);
    }
}

/// The scheduler wired to a stdio host
pub struct BridgeWorker {
    service: NotificationService,
    bridge: HostBridge,
    commands: mpsc::UnboundedReceiver<HostCommand>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl BridgeWorker {
    pub fn new(store: Arc<dyn EventStore>, config: SchedulerConfig) -> Self {
        let (bridge, commands) = HostBridge::channel();
        let service = NotificationService::new(store, Arc::new(bridge.clone()), config);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            service,
            bridge,
            commands,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    pub fn service(&self) -> &NotificationService {
        &self.service
    }

    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger(self.shutdown_tx.clone())
    }

    /// Serve `reader` and write commands to `writer` until done
    pub async fn run<R, W>(self, reader: R, writer: &mut W) -> std::io::Result<BridgeSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let Self {
            service,
            bridge,
            commands,
            shutdown_tx,
            shutdown_rx,
        } = self;

        // `serve` owns every bridge clone, so the writer ends right after it
        let (served, written) = tokio::join!(
            serve(service, bridge, reader, shutdown_rx),
            write_commands(commands, writer),
        );
        drop(shutdown_tx);

        let mut summary = served?;
        summary.commands = written?;
        info!(
            messages = summary.messages,
            malformed = summary.malformed,
            passes = summary.passes,
            commands = summary.commands,
            "bridge finished"
        );
        Ok(summary)
    }
}

async fn serve<R>(
    service: NotificationService,
    bridge: HostBridge,
    reader: R,
    mut shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<BridgeSummary>
where
    R: AsyncBufRead + Unpin,
{
    let config = service.config();
    let min_interval_ms = u64::try_from(config.window.as_millis()).unwrap_or(u64::MAX);
    if let Err(e) = bridge.send(HostCommand::RegisterPeriodicSync {
        tag: config.wake_tag.clone(),
        min_interval_ms,
    }) {
        warn!(error = %e, "failed to register periodic sync");
    }

    let (lp, handle) = service.reconciliation_loop();
    let loop_task = tokio::spawn(lp.run());

    let mut summary = BridgeSummary::default();
    let mut lines = reader.lines();
    let read_result = loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = shutdown_rx.changed() => {
                info!("shutdown requested; stopping bridge");
                break Ok(());
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("input closed (EOF); stopping bridge");
                break Ok(());
            }
            Err(e) => {
                error!(error = %e, "failed to read host input");
                break Err(e);
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<HostMessage>(trimmed) {
            Ok(message) => {
                summary.messages += 1;
                route(&service, &bridge, &handle, message).await;
            }
            Err(e) => {
                summary.malformed += 1;
                warn!(error = %e, raw_line = %trimmed, "skipping malformed host message");
            }
        }
    };

    handle.shutdown();
    summary.passes = match loop_task.await {
        Ok(passes) => passes,
        Err(e) => {
            error!(error = %e, "reconciliation loop task failed");
            0
        }
    };

    read_result.map(|()| summary)
}

async fn route(
    service: &NotificationService,
    bridge: &HostBridge,
    handle: &LoopHandle,
    message: HostMessage,
) {
    debug!(kind = message.kind(), "host message");
    match message {
        HostMessage::Push { data } => {
            let raw = data.as_ref().map(push_bytes);
            service.ingest().handle(raw.as_deref()).await;
        }
        HostMessage::PeriodicSync { tag } => {
            if let Err(e) = handle.wake(WakeSignal::new(tag)).await {
                warn!(error = %e, "dropping wake signal");
            }
        }
        HostMessage::NotificationClick {
            notification,
            clients,
        } => {
            let surfaces = BridgeClients::new(clients, bridge.clone());
            service.interaction().on_click(&notification, &surfaces).await;
        }
    }
}
