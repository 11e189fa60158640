use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{EventId, EventRange, LedgerEvent, Result, StoredEvent};

/// A stream of stored events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StoredEvent>> + Send>>;

/// Core trait for event store implementations.
///
/// The store is an append-only log: events are validated, assigned an id and
/// written once. Nothing exposed here can alter or remove a stored event.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Validates and appends an event, returning the id the store assigned.
    ///
    /// Invalid events fail with `EventStoreError::Validation` and are never
    /// written. The append is atomic: either the whole event is stored or
    /// nothing is.
    async fn append(&self, event: LedgerEvent) -> Result<EventId>;

    /// Retrieves events whose id falls in `range`, ascending by id.
    ///
    /// `None` returns the whole log. A range matching nothing is an empty
    /// vector, not an error.
    async fn get_range(&self, range: Option<EventRange>) -> Result<Vec<StoredEvent>>;

    /// Streams all events in the store, ascending by id.
    async fn stream_all_events(&self) -> Result<EventStream>;

    /// Returns the number of stored events.
    async fn event_count(&self) -> Result<u64>;

    /// Returns the id of the most recent event, if any.
    async fn last_event_id(&self) -> Result<Option<EventId>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Retrieves the whole log.
    async fn get_all(&self) -> Result<Vec<StoredEvent>> {
        self.get_range(None).await
    }

    /// Retrieves events between two ids, given in either order.
    async fn get_between(&self, a: EventId, b: EventId) -> Result<Vec<StoredEvent>> {
        self.get_range(Some(EventRange::new(a, b))).await
    }

    /// Checks if the log holds any event.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.last_event_id().await?.is_none())
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Validates an event before appending and records the outcome.
pub(crate) fn validate_for_append(event: &LedgerEvent) -> Result<()> {
    if let Err(reason) = event.validate() {
        tracing::debug!(kind = %event.kind(), %reason, "rejected invalid event");
        return Err(reason.into());
    }
    Ok(())
}
