//! Read requests served to the presentation layer.

use event_store::{EventRange, EventStore, StoredEvent};
use serde::Serialize;

use crate::Result;
use crate::projector::{Snapshot, project, project_stream};

/// Rows of the log plus the state derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct History {
    /// The id window that was requested, `None` for the whole log.
    pub scope: Option<EventRange>,

    /// Events inside the window, ascending by id.
    pub events: Vec<StoredEvent>,

    /// State over the entire log, regardless of `scope`.
    pub snapshot: Snapshot,
}

/// Query side of the ledger.
///
/// Every call replays the store from scratch, so results can never drift
/// from the log. Cost is linear in the number of stored events.
#[derive(Clone)]
pub struct LedgerQueries<S: EventStore> {
    store: S,
}

impl<S: EventStore> LedgerQueries<S> {
    /// Creates a query service over the given event store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Projects the full log.
    #[tracing::instrument(skip(self))]
    pub async fn current_state(&self) -> Result<Snapshot> {
        let stream = self.store.stream_all_events().await?;
        let snapshot = project_stream(stream).await?;
        metrics::counter!("ledger_projections_run").increment(1);
        Ok(snapshot)
    }

    /// Lists events, optionally restricted to an id window.
    ///
    /// The window only limits which rows come back. The snapshot is always
    /// computed over the whole log, it is not the state as of the window.
    /// Rows and snapshot come from the same single read of the log.
    #[tracing::instrument(skip(self))]
    pub async fn history(&self, range: Option<EventRange>) -> Result<History> {
        let mut events = self.store.get_range(None).await?;
        let snapshot = project(&events);
        metrics::counter!("ledger_projections_run").increment(1);

        if let Some(range) = range {
            events.retain(|stored| range.contains(stored.id));
        }

        tracing::debug!(rows = events.len(), "history loaded");

        Ok(History {
            scope: range,
            events,
            snapshot,
        })
    }
}
