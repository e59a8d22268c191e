//! Due-window evaluation
//!
//! An event is due only while its deadline lies inside the single window
//! `(now, now + window]`. Events at or before `now` are past due; events
//! beyond the window are upcoming.

use std::time::Duration;

/// Default notification window (and timer cadence)
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Where an event's deadline falls relative to the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    /// Deadline is inside `(now, now + window]`
    Due,
    /// Deadline is later than `now + window`
    Upcoming,
    /// Deadline is at or before `now`
    PastDue,
}

/// Classify an event deadline against `now` (both epoch milliseconds)
pub fn classify(event_timestamp: i64, now: i64, window: Duration) -> DueState {
    // i128 keeps the subtraction exact for any pair of i64 instants
    let remaining = i128::from(event_timestamp) - i128::from(now);
    let window_ms = window.as_millis() as i128;

    if remaining <= 0 {
        DueState::PastDue
    } else if remaining <= window_ms {
        DueState::Due
    } else {
        DueState::Upcoming
    }
}

/// Whether `0 < event_timestamp - now <= window`
pub fn is_due(event_timestamp: i64, now: i64, window: Duration) -> bool {
    classify(event_timestamp, now, window) == DueState::Due
}
