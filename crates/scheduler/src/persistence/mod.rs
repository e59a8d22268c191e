//! Persistence layer for pending events
//!
//! This module provides:
//! - [`EventStore`] trait for the keyed `events` collection
//! - [`InMemoryEventStore`] for testing and database-less runs
//! - [`SqliteEventStore`] for durable storage across restarts

mod memory;
mod sqlite;
mod store;

pub use memory::InMemoryEventStore;
pub use sqlite::SqliteEventStore;
pub use store::{Event, EventId, EventStore, NewEvent, StoreError, EVENTS_COLLECTION};
