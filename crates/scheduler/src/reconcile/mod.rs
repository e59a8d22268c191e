//! Reconciliation: deciding which pending events fire
//!
//! This module provides:
//! - [`Reconciler`] - one load-all, evaluate, dispatch pass
//! - [`ReconciliationLoop`] - runs passes on a timer and on wake signals
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │ cadence tick │   │ wake signal  │
//! └──────┬───────┘   └──────┬───────┘
//!        └────────┬─────────┘
//!                 ▼
//!  ┌─────────────────────────────┐
//!  │ Reconciler::run_pass        │  (one task per trigger)
//!  │  open → list_all → classify │
//!  └──────────────┬──────────────┘
//!                 ▼
//!  ┌─────────────────────────────┐
//!  │ display_and_retire (due)    │
//!  └─────────────────────────────┘
//! ```

mod pass;
mod scheduler;

pub use pass::{PassReport, Reconciler};
pub use scheduler::{LoopError, LoopHandle, ReconciliationLoop, Trigger, WakeSignal};
