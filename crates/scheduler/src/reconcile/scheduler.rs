//! Timer- and wake-driven reconciliation loop

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use super::pass::Reconciler;
use crate::config::{SchedulerConfig, MAX_INTERVAL};

/// Capacity of the wake signal queue
const WAKE_QUEUE_CAPACITY: usize = 16;

/// Shortest timer cadence the loop will run with
const MIN_CADENCE: Duration = Duration::from_millis(1);

/// A platform-delivered periodic wake-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeSignal {
    pub tag: String,
}

impl WakeSignal {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

/// What started a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    Wake,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timer => write!(f, "timer"),
            Self::Wake => write!(f, "wake"),
        }
    }
}

/// Loop errors
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// The loop has stopped and no longer accepts wake signals
    #[error("reconciliation loop is shut down")]
    Shutdown,
}

/// Handle for feeding wake signals to, and stopping, a running loop
#[derive(Clone)]
pub struct LoopHandle {
    wake_tx: mpsc::Sender<WakeSignal>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl LoopHandle {
    /// Deliver a wake signal
    pub async fn wake(&self, signal: WakeSignal) -> Result<(), LoopError> {
        self.wake_tx
            .send(signal)
            .await
            .map_err(|_| LoopError::Shutdown)
    }

    /// Stop accepting triggers
    ///
    /// Wake signals already delivered and in-flight passes still run to
    /// completion.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

/// Drives reconciliation passes from two independent sources
///
/// A fixed-cadence timer and tagged wake signals both start the same pass
/// body. Each pass runs as its own task, so passes started close together
/// interleave at await points; the store's idempotent delete and the
/// display-then-delete ordering keep that safe without a lock.
pub struct ReconciliationLoop {
    reconciler: Arc<Reconciler>,
    cadence: Duration,
    wake_tag: String,
    wake_rx: mpsc::Receiver<WakeSignal>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ReconciliationLoop {
    /// Create a loop and the handle that controls it
    pub fn new(reconciler: Arc<Reconciler>, config: &SchedulerConfig) -> (Self, LoopHandle) {
        let (wake_tx, wake_rx) = mpsc::channel(WAKE_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let cadence = config.cadence.clamp(MIN_CADENCE, MAX_INTERVAL);
        if cadence != config.cadence {
            warn!(
                requested_ms = config.cadence.as_millis() as u64,
                cadence_ms = cadence.as_millis() as u64,
                "cadence out of range, clamped"
            );
        }

        let lp = Self {
            reconciler,
            cadence,
            wake_tag: config.wake_tag.clone(),
            wake_rx,
            shutdown_rx,
        };
        let handle = LoopHandle {
            wake_tx,
            shutdown_tx: Arc::new(shutdown_tx),
        };
        (lp, handle)
    }

    /// Run until shutdown, returning the number of passes that finished
    #[instrument(skip(self), fields(cadence_ms = self.cadence.as_millis() as u64, wake_tag = %self.wake_tag))]
    pub async fn run(mut self) -> usize {
        info!("reconciliation loop started");

        let mut ticker = interval_at(Instant::now() + self.cadence, self.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut passes = JoinSet::new();
        let mut finished = 0;
        let mut wake_open = true;

        while !*self.shutdown_rx.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.spawn_pass(&mut passes, Trigger::Timer);
                }
                signal = self.wake_rx.recv(), if wake_open => match signal {
                    Some(signal) if signal.tag == self.wake_tag => {
                        self.spawn_pass(&mut passes, Trigger::Wake);
                    }
                    Some(signal) => {
                        debug!(tag = %signal.tag, "ignoring wake signal with unknown tag");
                    }
                    None => {
                        debug!("wake channel closed, continuing on timer only");
                        wake_open = false;
                    }
                },
                Some(result) = passes.join_next(), if !passes.is_empty() => {
                    finished += Self::record(result);
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() {
                        debug!("shutdown sender dropped");
                        break;
                    }
                }
            }
        }

        // Wake signals delivered before shutdown still get their pass
        self.wake_rx.close();
        while let Ok(signal) = self.wake_rx.try_recv() {
            if signal.tag == self.wake_tag {
                self.spawn_pass(&mut passes, Trigger::Wake);
            }
        }

        if !passes.is_empty() {
            info!(in_flight = passes.len(), "waiting for in-flight passes");
        }
        while let Some(result) = passes.join_next().await {
            finished += Self::record(result);
        }

        info!(passes = finished, "reconciliation loop stopped");
        finished
    }

    fn spawn_pass(&self, passes: &mut JoinSet<()>, trigger: Trigger) {
        debug!(%trigger, "starting reconciliation pass");
        let reconciler = self.reconciler.clone();
        passes.spawn(async move {
            reconciler.run_pass().await;
        });
    }

    fn record(result: Result<(), tokio::task::JoinError>) -> usize {
        match result {
            Ok(()) => 1,
            Err(e) if e.is_panic() => {
                error!(error = %e, "reconciliation pass panicked");
                0
            }
            Err(e) => {
                warn!(error = %e, "reconciliation pass did not finish");
                0
            }
        }
    }
}
