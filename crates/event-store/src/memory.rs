use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    EventId, EventRange, LedgerEvent, Result, StoredEvent,
    store::{EventStore, EventStream, validate_for_append},
};

/// In-memory event store implementation for testing.
///
/// This implementation stores all events in memory and provides
/// the same interface as the SQLite implementation.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: LedgerEvent) -> Result<EventId> {
        validate_for_append(&event)?;

        let mut store = self.events.write().await;

        // Ids follow the last stored one, the log is never shortened
        let id = store
            .last()
            .map(|e| e.id.next())
            .unwrap_or_else(EventId::first);
        store.push(StoredEvent::new(id, Utc::now(), event));

        Ok(id)
    }

    async fn get_range(&self, range: Option<EventRange>) -> Result<Vec<StoredEvent>> {
        let store = self.events.read().await;
        let events = match range {
            Some(range) => store
                .iter()
                .filter(|e| range.contains(e.id))
                .cloned()
                .collect(),
            None => store.clone(),
        };
        Ok(events)
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.events.read().await.clone();
        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn event_count(&self) -> Result<u64> {
        Ok(self.events.read().await.len() as u64)
    }

    async fn last_event_id(&self) -> Result<Option<EventId>> {
        Ok(self.events.read().await.last().map(|e| e.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventStoreError, EventStoreExt, ValidationError};

    async fn seeded_store() -> InMemoryEventStore {
        let store = InMemoryEventStore::new();
        store
            .append(LedgerEvent::buy("Widget", 10.0, 5))
            .await
            .unwrap();
        store
            .append(LedgerEvent::sell("Widget", 12.0, 5))
            .await
            .unwrap();
        store
            .append(LedgerEvent::balance("fee", -3.5))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn append_assigns_increasing_ids() {
        let store = InMemoryEventStore::new();

        let first = store
            .append(LedgerEvent::buy("Widget", 10.0, 5))
            .await
            .unwrap();
        let second = store
            .append(LedgerEvent::balance("", 1.0))
            .await
            .unwrap();

        assert_eq!(first, EventId::first());
        assert!(second > first);
        assert_eq!(store.event_count().await.unwrap(), 2);
        assert_eq!(store.last_event_id().await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn invalid_event_is_not_stored() {
        let store = seeded_store().await;

        let result = store.append(LedgerEvent::buy("", 1.0, 1)).await;

        assert!(matches!(
            result,
            Err(EventStoreError::Validation(ValidationError::MissingProduct))
        ));
        assert_eq!(store.event_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn get_range_none_returns_everything_in_order() {
        let store = seeded_store().await;

        let events = store.get_all().await.unwrap();

        let ids: Vec<i64> = events.iter().map(|e| e.id.as_i64()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn get_range_is_symmetric() {
        let store = seeded_store().await;

        let forward = store
            .get_between(EventId::new(1), EventId::new(2))
            .await
            .unwrap();
        let backward = store
            .get_between(EventId::new(2), EventId::new(1))
            .await
            .unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 2);
        assert_eq!(forward[0].id, EventId::new(1));
        assert_eq!(forward[1].id, EventId::new(2));
    }

    #[tokio::test]
    async fn decoded_reversed_range_matches_forward() {
        let store = seeded_store().await;
        let decoded: EventRange = serde_json::from_str(r#"{"from":2,"to":1}"#).unwrap();

        let events = store.get_range(Some(decoded)).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(
            events,
            store
                .get_range(Some(EventRange::between(1, 2)))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn range_outside_log_is_empty() {
        let store = seeded_store().await;

        let events = store
            .get_range(Some(EventRange::between(10, 20)))
            .await
            .unwrap();

        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn stream_all_events() {
        use futures_util::StreamExt;

        let store = seeded_store().await;

        let stream = store.stream_all_events().await.unwrap();
        let events: Vec<_> = stream.collect().await;

        assert_eq!(events.len(), 3);
        assert_eq!(events[2].as_ref().unwrap().kind(), crate::EventKind::Balance);
    }

    #[tokio::test]
    async fn empty_store() {
        let store = InMemoryEventStore::new();

        assert!(store.is_empty().await.unwrap());
        assert_eq!(store.last_event_id().await.unwrap(), None);
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
