//! In-memory implementation of EventStore for testing

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::store::*;

/// In-memory implementation of EventStore
///
/// This is primarily for testing and for running the worker without a
/// database. It provides the same semantics as the SQLite implementation,
/// including monotonic id assignment that never reuses a deleted id.
///
/// # Example
///
/// ```
/// use duewatch_scheduler::InMemoryEventStore;
///
/// let store = InMemoryEventStore::new();
/// assert_eq!(store.len(), 0);
/// ```
pub struct InMemoryEventStore {
    events: RwLock<BTreeMap<EventId, Event>>,
    last_id: AtomicI64,
    opened: AtomicBool,
}

impl InMemoryEventStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            events: RwLock::new(BTreeMap::new()),
            last_id: AtomicI64::new(0),
            opened: AtomicBool::new(false),
        }
    }

    /// Get the number of pending events
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether no events are pending
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Whether an event with this id is pending
    pub fn contains(&self, id: EventId) -> bool {
        self.events.read().contains_key(&id)
    }

    /// Whether `open` has been called at least once
    pub fn is_opened(&self) -> bool {
        self.opened.load(Ordering::SeqCst)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn open(&self) -> Result<(), StoreError> {
        self.opened.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn insert(&self, event: NewEvent) -> Result<EventId, StoreError> {
        let mut events = self.events.write();

        let id = match event.id {
            Some(id) => {
                if events.contains_key(&id) {
                    return Err(StoreError::WriteFailed(format!(
                        "duplicate key {id} in {EVENTS_COLLECTION}"
                    )));
                }
                self.last_id.fetch_max(id, Ordering::SeqCst);
                id
            }
            None => self.last_id.fetch_add(1, Ordering::SeqCst) + 1,
        };

        events.insert(
            id,
            Event {
                id,
                title: event.title,
                timestamp: event.timestamp,
            },
        );
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.events.read().values().cloned().collect())
    }

    async fn delete_by_id(&self, id: EventId) -> Result<(), StoreError> {
        self.events.write().remove(&id);
        Ok(())
    }
}
