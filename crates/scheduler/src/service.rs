//! Wiring of the components around one shared store

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::ingest::IngestHandler;
use crate::interaction::InteractionHandler;
use crate::notify::{NotificationDispatcher, Notifier};
use crate::persistence::{EventStore, InMemoryEventStore, SqliteEventStore, StoreError};
use crate::reconcile::{LoopHandle, ReconciliationLoop, Reconciler};

/// All components sharing one store and one notifier
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use duewatch_scheduler::prelude::*;
///
/// let service = NotificationService::new(
///     Arc::new(InMemoryEventStore::new()),
///     Arc::new(InMemoryNotifier::new()),
///     SchedulerConfig::default(),
/// );
/// assert_eq!(service.config().wake_tag, "check-events");
/// ```
#[derive(Clone)]
pub struct NotificationService {
    config: SchedulerConfig,
    store: Arc<dyn EventStore>,
    dispatcher: Arc<NotificationDispatcher>,
    reconciler: Arc<Reconciler>,
    ingest: Arc<IngestHandler>,
    interaction: Arc<InteractionHandler>,
}

impl NotificationService {
    pub fn new(
        store: Arc<dyn EventStore>,
        notifier: Arc<dyn Notifier>,
        config: SchedulerConfig,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            store.clone(),
            notifier.clone(),
            config.defaults.clone(),
        ));
        let reconciler = Arc::new(Reconciler::new(store.clone(), dispatcher.clone(), &config));
        let ingest = Arc::new(IngestHandler::new(store.clone(), dispatcher.clone()));
        let interaction = Arc::new(InteractionHandler::new(
            notifier,
            config.defaults.url.clone(),
        ));

        Self {
            config,
            store,
            dispatcher,
            reconciler,
            ingest,
            interaction,
        }
    }

    /// Build the store named by `config.database_url`, or an in-memory one
    pub fn store_for(config: &SchedulerConfig) -> Result<Arc<dyn EventStore>, StoreError> {
        match &config.database_url {
            Some(url) => Ok(Arc::new(SqliteEventStore::connect_lazy(url)?)),
            None => Ok(Arc::new(InMemoryEventStore::new())),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    pub fn ingest(&self) -> &Arc<IngestHandler> {
        &self.ingest
    }

    pub fn interaction(&self) -> &Arc<InteractionHandler> {
        &self.interaction
    }

    /// Create the reconciliation loop for this service
    pub fn reconciliation_loop(&self) -> (ReconciliationLoop, LoopHandle) {
        ReconciliationLoop::new(self.reconciler.clone(), &self.config)
    }
}
