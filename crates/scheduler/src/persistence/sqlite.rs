//! SQLite implementation of EventStore
//!
//! Durable persistence using SQLite with:
//! - Lazy connection, so an unreachable database surfaces on `open`
//! - `AUTOINCREMENT` keys, so retired ids are never handed out again
//! - Schema creation on first use

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::{debug, error, instrument};

use super::store::*;

/// SQLite implementation of EventStore
///
/// # Example
///
/// ```ignore
/// use duewatch_scheduler::SqliteEventStore;
///
/// let store = SqliteEventStore::connect_lazy("sqlite://duewatch.db")?;
/// store.open().await?;
/// ```
#[derive(Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    /// Create a new SQLite store with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Build a lazily-connecting store from a `sqlite:` URL
    ///
    /// The database file is created if missing. No connection is made until
    /// the first operation, normally [`EventStore::open`].
    pub fn connect_lazy(url: &str) -> Result<Self, StoreError> {
        if !url.starts_with("sqlite:") {
            return Err(StoreError::Unavailable(format!(
                "unsupported database url: {url}"
            )));
        }

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Unavailable(format!("invalid database url: {e}")))?
            .create_if_missing(true);

        // An in-memory database lives only as long as its connection
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };

        Ok(Self::new(pool_options.connect_lazy_with(options)))
    }

    /// A private in-memory database, mostly useful in tests
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::connect_lazy("sqlite::memory:")
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    #[instrument(skip(self))]
    async fn open(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to open event store: {}", e);
            StoreError::Unavailable(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self, event), fields(title = %event.title))]
    async fn insert(&self, event: NewEvent) -> Result<EventId, StoreError> {
        // A NULL id lets SQLite assign the next key
        let result = sqlx::query(
            r#"
            INSERT INTO events (id, title, timestamp)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to insert event: {}", e);
            StoreError::WriteFailed(e.to_string())
        })?;

        let id = result.last_insert_rowid();
        debug!(event_id = id, "inserted event");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, timestamp FROM events
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list events: {}", e);
            StoreError::ReadFailed(e.to_string())
        })?;

        rows.iter()
            .map(|row| {
                Ok(Event {
                    id: row
                        .try_get("id")
                        .map_err(|e| StoreError::ReadFailed(e.to_string()))?,
                    title: row
                        .try_get("title")
                        .map_err(|e| StoreError::ReadFailed(e.to_string()))?,
                    timestamp: row
                        .try_get("timestamp")
                        .map_err(|e| StoreError::ReadFailed(e.to_string()))?,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: EventId) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM events WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to delete event: {}", e);
            StoreError::WriteFailed(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            debug!(event_id = id, "event already deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_store() -> SqliteEventStore {
        let store = SqliteEventStore::in_memory().unwrap();
        store.open().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = open_store().await;

        let id = store
            .insert(NewEvent::new("Apply Now", 1_700_000_000_000))
            .await
            .unwrap();

        let events = store.list_all().await.unwrap();
        assert_eq!(
            events,
            vec![Event {
                id,
                title: "Apply Now".to_string(),
                timestamp: 1_700_000_000_000,
            }]
        );
    }

    #[tokio::test]
    async fn test_open_twice_keeps_data() {
        let store = open_store().await;
        store.insert(NewEvent::new("kept", 1)).await.unwrap();

        store.open().await.unwrap();

        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = open_store().await;

        let first = store.insert(NewEvent::new("a", 1)).await.unwrap();
        store.delete_by_id(first).await.unwrap();
        let second = store.insert(NewEvent::new("b", 2)).await.unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_duplicate_predecided_id() {
        let store = open_store().await;

        let id = store
            .insert(NewEvent::new("first", 1).with_id(10))
            .await
            .unwrap();
        assert_eq!(id, 10);

        let result = store.insert(NewEvent::new("second", 2).with_id(10)).await;
        assert!(matches!(result, Err(StoreError::WriteFailed(_))));
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let store = open_store().await;
        let id = store.insert(NewEvent::new("x", 1)).await.unwrap();

        store.delete_by_id(id).await.unwrap();
        store.delete_by_id(id).await.unwrap();

        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_before_open_fails_as_read() {
        let store = SqliteEventStore::in_memory().unwrap();

        let result = store.list_all().await;
        assert!(matches!(result, Err(StoreError::ReadFailed(_))));
    }

    #[tokio::test]
    async fn test_unopenable_database_is_unavailable() {
        let store =
            SqliteEventStore::connect_lazy("sqlite:///nonexistent-dir/duewatch/events.db").unwrap();

        let result = store.open().await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_invalid_url_is_unavailable() {
        let result = SqliteEventStore::connect_lazy("postgres://localhost/db");
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
