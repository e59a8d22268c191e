//! # Deadline Notification Scheduler
//!
//! Reminds users about time-bound events (application deadlines and the
//! like) without duplicate or late notifications, even when the host process
//! is not running continuously.
//!
//! ## Features
//!
//! - **Persisted pending events**: in-memory or SQLite, re-opened every pass
//! - **Due window**: an event fires only while its deadline is within the
//!   next `window` (default 60 minutes)
//! - **Display-then-retire**: an event is deleted only after its reminder was
//!   shown, so a failed display is retried on the next pass
//! - **Two triggers**: a fixed-cadence timer and tagged host wake signals
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────────────────┐
//! │  IngestHandler   │───────▶│ NotificationDispatcher   │
//! │  (push payloads) │        │ display_immediate        │
//! └────────┬─────────┘        │ display_and_retire       │
//!          │ insert           └────────────▲─────────────┘
//!          ▼                               │ due events
//! ┌──────────────────┐  list_all  ┌────────┴─────────────┐
//! │   EventStore     │◀───────────│ ReconciliationLoop   │
//! │  (events by id)  │            │ timer + wake signal  │
//! └──────────────────┘            └──────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use duewatch_scheduler::prelude::*;
//!
//! let config = SchedulerConfig::from_env()?;
//! let store = NotificationService::store_for(&config)?;
//! let service = NotificationService::new(store, notifier, config);
//!
//! let (lp, handle) = service.reconciliation_loop();
//! tokio::spawn(lp.run());
//!
//! service.ingest().handle(Some(payload_bytes)).await;
//! handle.wake(WakeSignal::new("check-events")).await?;
//! ```

pub mod config;
pub mod due;
pub mod ingest;
pub mod interaction;
pub mod notify;
pub mod persistence;
pub mod reconcile;
pub mod service;
pub mod telemetry;

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::{NotificationDefaults, PastDuePolicy, SchedulerConfig};
    pub use crate::due::{classify, is_due, DueState};
    pub use crate::ingest::{IngestHandler, IngestOutcome, PushPayload};
    pub use crate::interaction::{
        ClickOutcome, ClientSurface, ClientSurfaces, InMemoryClientSurfaces, InteractionHandler,
    };
    pub use crate::notify::{
        InMemoryNotifier, Notification, NotificationDispatcher, NotificationOptions, Notifier,
    };
    pub use crate::persistence::{
        Event, EventId, EventStore, InMemoryEventStore, NewEvent, SqliteEventStore, StoreError,
    };
    pub use crate::reconcile::{LoopHandle, PassReport, ReconciliationLoop, Reconciler, WakeSignal};
    pub use crate::service::NotificationService;
}

// Re-export key types at crate root
pub use config::{ConfigError, NotificationDefaults, PastDuePolicy, SchedulerConfig};
pub use due::{classify, is_due, DueState, DEFAULT_WINDOW};
pub use ingest::{IngestError, IngestHandler, IngestOutcome, PushPayload};
pub use interaction::{
    ClickOutcome, ClientSurface, ClientSurfaces, InMemoryClientSurfaces, InteractionError,
    InteractionHandler,
};
pub use notify::{
    DispatchError, DisplayError, InMemoryNotifier, Notification, NotificationAction,
    NotificationDispatcher, NotificationOptions, Notifier,
};
pub use persistence::{
    Event, EventId, EventStore, InMemoryEventStore, NewEvent, SqliteEventStore, StoreError,
};
pub use reconcile::{LoopError, LoopHandle, PassReport, ReconciliationLoop, Reconciler, WakeSignal};
pub use service::NotificationService;
