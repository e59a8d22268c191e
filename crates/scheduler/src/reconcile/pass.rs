//! A single reconciliation pass

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::{PastDuePolicy, SchedulerConfig};
use crate::due::{classify, DueState};
use crate::notify::NotificationDispatcher;
use crate::persistence::{EventStore, StoreError};

/// Outcome of one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Events loaded from the store
    pub examined: usize,

    /// Due events shown and retired
    pub dispatched: usize,

    /// Due events whose display or delete failed
    pub failed: usize,

    /// Past-due events deleted under [`PastDuePolicy::Discard`]
    pub discarded: usize,
}

/// Load-all, evaluate, dispatch
///
/// Holds no event state of its own; every pass re-opens the store and works
/// from what it reads.
pub struct Reconciler {
    store: Arc<dyn EventStore>,
    dispatcher: Arc<NotificationDispatcher>,
    window: Duration,
    past_due: PastDuePolicy,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn EventStore>,
        dispatcher: Arc<NotificationDispatcher>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            window: config.window,
            past_due: config.past_due,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run a pass against the wall clock, logging and swallowing failures
    pub async fn run_pass(&self) -> Option<PassReport> {
        self.run_pass_with(|| Utc::now().timestamp_millis()).await
    }

    /// Run a pass against a fixed `now`, logging and swallowing failures
    pub async fn run_pass_at(&self, now: i64) -> Option<PassReport> {
        self.run_pass_with(|| now).await
    }

    async fn run_pass_with(&self, now: impl FnOnce() -> i64) -> Option<PassReport> {
        match self.try_run_pass(now).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, "reconciliation pass failed");
                None
            }
        }
    }

    /// Run a pass, returning store open/read failures to the caller
    ///
    /// Per-event failures never abort the pass; they are counted in
    /// [`PassReport::failed`].
    #[instrument(skip_all, fields(pass_id = %uuid::Uuid::now_v7()))]
    pub async fn try_run_pass(
        &self,
        now: impl FnOnce() -> i64,
    ) -> Result<PassReport, StoreError> {
        self.store.open().await?;
        let events = self.store.list_all().await?;
        let now = now();

        let mut report = PassReport {
            examined: events.len(),
            ..Default::default()
        };

        for event in &events {
            match classify(event.timestamp, now, self.window) {
                DueState::Due => match self.dispatcher.display_and_retire(event).await {
                    Ok(()) => report.dispatched += 1,
                    Err(e) => {
                        warn!(event_id = event.id, error = %e, "failed to dispatch due event");
                        report.failed += 1;
                    }
                },
                DueState::PastDue if self.past_due == PastDuePolicy::Discard => {
                    match self.store.delete_by_id(event.id).await {
                        Ok(()) => {
                            warn!(
                                event_id = event.id,
                                timestamp = event.timestamp,
                                "discarded past-due event without notifying"
                            );
                            report.discarded += 1;
                        }
                        Err(e) => {
                            warn!(event_id = event.id, error = %e, "failed to discard past-due event");
                        }
                    }
                }
                DueState::PastDue | DueState::Upcoming => {}
            }
        }

        if report.dispatched > 0 || report.failed > 0 || report.discarded > 0 {
            info!(
                examined = report.examined,
                dispatched = report.dispatched,
                failed = report.failed,
                discarded = report.discarded,
                "reconciliation pass complete"
            );
        } else {
            debug!(examined = report.examined, "reconciliation pass found nothing due");
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationDefaults;
    use crate::notify::InMemoryNotifier;
    use crate::persistence::{Event, EventId, InMemoryEventStore, NewEvent};
    use async_trait::async_trait;

    const NOW: i64 = 1_700_000_000_000;
    const MINUTE: i64 = 60 * 1000;

    struct UnavailableStore;

    #[async_trait]
    impl EventStore for UnavailableStore {
        async fn open(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("engine offline".to_string()))
        }

        async fn insert(&self, _event: NewEvent) -> Result<EventId, StoreError> {
            unreachable!("insert after failed open")
        }

        async fn list_all(&self) -> Result<Vec<Event>, StoreError> {
            unreachable!("list after failed open")
        }

        async fn delete_by_id(&self, _id: EventId) -> Result<(), StoreError> {
            unreachable!("delete after failed open")
        }
    }

    fn reconciler_for(
        store: Arc<dyn EventStore>,
        notifier: Arc<InMemoryNotifier>,
        config: &SchedulerConfig,
    ) -> Reconciler {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            store.clone(),
            notifier,
            NotificationDefaults::default(),
        ));
        Reconciler::new(store, dispatcher, config)
    }

    fn setup(config: SchedulerConfig) -> (Arc<InMemoryEventStore>, Arc<InMemoryNotifier>, Reconciler) {
        let store = Arc::new(InMemoryEventStore::new());
        let notifier = Arc::new(InMemoryNotifier::new());
        let reconciler = reconciler_for(store.clone(), notifier.clone(), &config);
        (store, notifier, reconciler)
    }

    #[tokio::test]
    async fn test_pass_dispatches_only_due_events() {
        let (store, notifier, reconciler) = setup(SchedulerConfig::default());
        let due = store
            .insert(NewEvent::new("due", NOW + 30 * MINUTE))
            .await
            .unwrap();
        let later = store
            .insert(NewEvent::new("later", NOW + 90 * MINUTE))
            .await
            .unwrap();
        let past = store
            .insert(NewEvent::new("past", NOW - 5 * MINUTE))
            .await
            .unwrap();

        let report = reconciler.run_pass_at(NOW).await.unwrap();

        assert_eq!(
            report,
            PassReport {
                examined: 3,
                dispatched: 1,
                failed: 0,
                discarded: 0,
            }
        );
        assert_eq!(notifier.shown_titles(), vec!["due".to_string()]);
        assert!(!store.contains(due));
        assert!(store.contains(later));
        assert!(store.contains(past));
        assert!(store.is_opened());
    }

    #[tokio::test]
    async fn test_failed_event_does_not_block_others() {
        let (store, notifier, reconciler) = setup(SchedulerConfig::default());
        let broken = store
            .insert(NewEvent::new("broken", NOW + MINUTE))
            .await
            .unwrap();
        let fine = store
            .insert(NewEvent::new("fine", NOW + 2 * MINUTE))
            .await
            .unwrap();
        notifier.fail_title("broken");

        let report = reconciler.run_pass_at(NOW).await.unwrap();

        assert_eq!(report.dispatched, 1);
        assert_eq!(report.failed, 1);
        assert!(store.contains(broken));
        assert!(!store.contains(fine));
    }

    #[tokio::test]
    async fn test_failed_display_is_retried_next_pass() {
        let (store, notifier, reconciler) = setup(SchedulerConfig::default());
        let id = store
            .insert(NewEvent::new("retry me", NOW + 10 * MINUTE))
            .await
            .unwrap();

        notifier.fail_all(true);
        reconciler.run_pass_at(NOW).await.unwrap();
        assert!(store.contains(id));

        notifier.fail_all(false);
        let report = reconciler.run_pass_at(NOW + MINUTE).await.unwrap();
        assert_eq!(report.dispatched, 1);
        assert!(!store.contains(id));
    }

    #[tokio::test]
    async fn test_discard_policy_removes_past_due_silently() {
        let (store, notifier, reconciler) = setup(
            SchedulerConfig::default().with_past_due_policy(PastDuePolicy::Discard),
        );
        let past = store
            .insert(NewEvent::new("past", NOW - 5 * MINUTE))
            .await
            .unwrap();
        let later = store
            .insert(NewEvent::new("later", NOW + 90 * MINUTE))
            .await
            .unwrap();

        let report = reconciler.run_pass_at(NOW).await.unwrap();

        assert_eq!(report.discarded, 1);
        assert_eq!(notifier.shown_count(), 0);
        assert!(!store.contains(past));
        assert!(store.contains(later));
    }

    #[tokio::test]
    async fn test_unavailable_store_is_swallowed() {
        let notifier = Arc::new(InMemoryNotifier::new());
        let reconciler = reconciler_for(
            Arc::new(UnavailableStore),
            notifier.clone(),
            &SchedulerConfig::default(),
        );

        assert!(reconciler.run_pass_at(NOW).await.is_none());
        assert!(matches!(
            reconciler.try_run_pass(|| NOW).await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(notifier.shown_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let (_store, notifier, reconciler) = setup(SchedulerConfig::default());

        let report = reconciler.run_pass().await.unwrap();

        assert_eq!(report, PassReport::default());
        assert_eq!(notifier.shown_count(), 0);
    }
}
