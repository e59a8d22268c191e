//! EventStore trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Name of the keyed collection holding pending events
pub const EVENTS_COLLECTION: &str = "events";

/// Store-assigned event key
pub type EventId = i64;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing engine could not be opened
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A read failed
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// A write failed (constraint violation or I/O)
    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// A pending event as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,

    /// Display string used in the notification
    pub title: String,

    /// Deadline, epoch milliseconds
    pub timestamp: i64,
}

/// An event about to be inserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Pre-decided id; assigned by the store when `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
    pub title: String,
    pub timestamp: i64,
}

impl NewEvent {
    pub fn new(title: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: None,
            title: title.into(),
            timestamp,
        }
    }

    /// Use a producer-chosen id instead of a store-assigned one
    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Durable keyed collection of pending events
///
/// Implementations must be safe to share across tasks. Callers re-open the
/// store at the start of every reconciliation pass, so `open` must be cheap
/// and idempotent.
#[async_trait]
pub trait EventStore: Send + Sync + 'static {
    /// Create the `events` collection if absent
    async fn open(&self) -> Result<(), StoreError>;

    /// Insert a new event, returning its id
    async fn insert(&self, event: NewEvent) -> Result<EventId, StoreError>;

    /// Every pending event, in no particular order
    async fn list_all(&self) -> Result<Vec<Event>, StoreError>;

    /// Remove an event by id
    ///
    /// Deleting an absent id is not an error: two interleaved passes may
    /// both try to retire the same event.
    async fn delete_by_id(&self, id: EventId) -> Result<(), StoreError>;
}
