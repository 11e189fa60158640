//! Folding the event log into the current stock and cash state.

use std::collections::BTreeMap;

use common::EventId;
use event_store::{EventStream, LedgerEvent, StoredEvent};
use futures_util::StreamExt;
use serde::Serialize;

use crate::Result;

/// Tracks how far a projector has read into the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of events folded in.
    pub events_processed: u64,

    /// Id of the last event folded in.
    pub last_event_id: Option<EventId>,
}

impl ProjectionPosition {
    /// Creates a new position at zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Advances the position past `id`.
    pub fn advance(&self, id: EventId) -> Self {
        Self {
            events_processed: self.events_processed + 1,
            last_event_id: Some(id),
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.events_processed)
    }
}

/// Stock levels and cash balance derived from the log.
///
/// Never stored. Products whose net quantity is zero are not present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    stock: BTreeMap<String, i64>,
    cash: f64,
    as_of: Option<EventId>,
}

impl Snapshot {
    /// Net quantity per product, ordered by product name.
    pub fn stock(&self) -> &BTreeMap<String, i64> {
        &self.stock
    }

    /// Net quantity of one product, `None` when it nets to zero or never moved.
    pub fn quantity_of(&self, product: &str) -> Option<i64> {
        self.stock.get(product).copied()
    }

    /// Cash balance at full precision.
    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Cash balance rounded to two decimals, half away from zero.
    pub fn cash_rounded(&self) -> f64 {
        (self.cash * 100.0).round() / 100.0
    }

    /// Cash balance formatted with two decimals.
    pub fn cash_display(&self) -> String {
        format!("{:.2}", self.cash_rounded())
    }

    /// Id of the last event the snapshot includes.
    pub fn as_of(&self) -> Option<EventId> {
        self.as_of
    }

    pub fn into_parts(self) -> (BTreeMap<String, i64>, f64) {
        (self.stock, self.cash)
    }
}

/// Left fold over ledger events in ascending id order.
///
/// Each step is pure: the same events in the same order always produce the
/// same snapshot.
#[derive(Debug, Clone, Default)]
pub struct Projector {
    stock: BTreeMap<String, i64>,
    cash: f64,
    position: ProjectionPosition,
}

impl Projector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the running totals.
    pub fn apply(&mut self, stored: &StoredEvent) {
        match &stored.event {
            LedgerEvent::Buy(trade) => {
                *self.stock.entry(trade.product.clone()).or_default() += i64::from(trade.quantity);
                self.cash -= trade.total();
            }
            LedgerEvent::Sell(trade) => {
                *self.stock.entry(trade.product.clone()).or_default() -= i64::from(trade.quantity);
                self.cash += trade.total();
            }
            LedgerEvent::Balance(adjustment) => {
                self.cash += adjustment.value;
            }
        }
        self.position = self.position.advance(stored.id);
    }

    pub fn position(&self) -> ProjectionPosition {
        self.position
    }

    /// Ends the fold, dropping products that net to zero.
    pub fn finish(self) -> Snapshot {
        let stock = self
            .stock
            .into_iter()
            .filter(|(_, quantity)| *quantity != 0)
            .collect();

        Snapshot {
            stock,
            cash: self.cash,
            as_of: self.position.last_event_id,
        }
    }
}

/// Projects an ordered sequence of events into a snapshot.
pub fn project<'a>(events: impl IntoIterator<Item = &'a StoredEvent>) -> Snapshot {
    let mut projector = Projector::new();
    for event in events {
        projector.apply(event);
    }
    projector.finish()
}

/// Projects an event stream, as returned by a store, into a snapshot.
pub async fn project_stream(mut stream: EventStream) -> Result<Snapshot> {
    let mut projector = Projector::new();

    while let Some(result) = stream.next().await {
        projector.apply(&result?);
    }

    tracing::debug!(position = %projector.position(), "projection complete");
    Ok(projector.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn stored(events: Vec<LedgerEvent>) -> Vec<StoredEvent> {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        events
            .into_iter()
            .enumerate()
            .map(|(i, event)| StoredEvent::new(EventId::new(i as i64 + 1), timestamp, event))
            .collect()
    }

    #[test]
    fn empty_log_projects_to_empty_snapshot() {
        let snapshot = project(&Vec::new());

        assert!(snapshot.stock().is_empty());
        assert_eq!(snapshot.cash(), 0.0);
        assert_eq!(snapshot.as_of(), None);
        assert_eq!(snapshot.cash_display(), "0.00");
    }

    #[test]
    fn buy_adds_stock_and_spends_cash() {
        let events = stored(vec![LedgerEvent::buy("Widget", 10.0, 5)]);

        let snapshot = project(&events);

        assert_eq!(snapshot.quantity_of("Widget"), Some(5));
        assert_eq!(snapshot.cash(), -50.0);
    }

    #[test]
    fn matching_sell_elides_product() {
        let events = stored(vec![
            LedgerEvent::buy("Widget", 10.0, 5),
            LedgerEvent::sell("Widget", 12.0, 5),
        ]);

        let snapshot = project(&events);

        assert!(snapshot.stock().is_empty());
        assert_eq!(snapshot.quantity_of("Widget"), None);
        assert_eq!(snapshot.cash(), 10.0);
    }

    #[test]
    fn balance_only_moves_cash() {
        let events = stored(vec![
            LedgerEvent::buy("Widget", 10.0, 5),
            LedgerEvent::sell("Widget", 12.0, 5),
            LedgerEvent::balance("fee", -3.5),
        ]);

        let snapshot = project(&events);

        assert!(snapshot.stock().is_empty());
        assert_eq!(snapshot.cash(), 6.5);
        assert_eq!(snapshot.as_of(), Some(EventId::new(3)));
    }

    #[test]
    fn overselling_leaves_negative_stock() {
        let events = stored(vec![
            LedgerEvent::buy("Gadget", 1.0, 2),
            LedgerEvent::sell("Gadget", 1.5, 3),
        ]);

        let snapshot = project(&events);

        assert_eq!(snapshot.quantity_of("Gadget"), Some(-1));
    }

    #[test]
    fn product_returning_to_zero_midway_reappears() {
        let events = stored(vec![
            LedgerEvent::buy("Widget", 1.0, 2),
            LedgerEvent::sell("Widget", 1.0, 2),
            LedgerEvent::buy("Widget", 1.0, 4),
            LedgerEvent::buy("Bolt", 0.1, 10),
        ]);

        let snapshot = project(&events);

        let stock: Vec<_> = snapshot.stock().iter().collect();
        assert_eq!(
            stock,
            vec![(&"Bolt".to_string(), &10), (&"Widget".to_string(), &4)]
        );
    }

    #[test]
    fn rounding_only_happens_on_display() {
        let events = stored(vec![
            LedgerEvent::balance("", 0.1),
            LedgerEvent::balance("", 0.2),
            LedgerEvent::balance("", 0.005),
        ]);

        let snapshot = project(&events);

        assert_ne!(snapshot.cash(), snapshot.cash_rounded());
        assert_eq!(snapshot.cash_rounded(), 0.31);
        assert_eq!(snapshot.cash_display(), "0.31");
    }

    #[test]
    fn negative_cash_display() {
        let events = stored(vec![LedgerEvent::buy("Widget", 3.333, 3)]);

        let snapshot = project(&events);

        assert_eq!(snapshot.cash_display(), "-10.00");
    }

    #[test]
    fn replaying_twice_gives_identical_snapshots() {
        let events = stored(vec![
            LedgerEvent::buy("Widget", 10.0, 5),
            LedgerEvent::balance("loan", 100.0),
            LedgerEvent::sell("Widget", 12.5, 2),
        ]);

        assert_eq!(project(&events), project(&events));
    }

    #[test]
    fn position_tracks_fold_progress() {
        let events = stored(vec![
            LedgerEvent::buy("Widget", 10.0, 5),
            LedgerEvent::balance("", 1.0),
        ]);

        let mut projector = Projector::new();
        assert_eq!(projector.position(), ProjectionPosition::zero());
        for event in &events {
            projector.apply(event);
        }

        assert_eq!(projector.position().events_processed, 2);
        assert_eq!(projector.position().last_event_id, Some(EventId::new(2)));
        assert_eq!(projector.position().to_string(), "position(2)");
    }

    #[test]
    fn snapshot_serializes_for_consumers() {
        let events = stored(vec![LedgerEvent::buy("Widget", 10.0, 5)]);

        let json = serde_json::to_value(project(&events)).unwrap();

        assert_eq!(json["stock"]["Widget"], 5);
        assert_eq!(json["cash"], -50.0);
        assert_eq!(json["as_of"], 1);
    }

    #[tokio::test]
    async fn project_stream_matches_project() {
        use event_store::{EventStore, InMemoryEventStore};

        let store = InMemoryEventStore::new();
        store
            .append(LedgerEvent::buy("Widget", 10.0, 5))
            .await
            .unwrap();
        store
            .append(LedgerEvent::sell("Widget", 12.0, 1))
            .await
            .unwrap();

        let streamed = project_stream(store.stream_all_events().await.unwrap())
            .await
            .unwrap();
        let listed = project(&store.get_range(None).await.unwrap());

        assert_eq!(streamed, listed);
        assert_eq!(streamed.quantity_of("Widget"), Some(4));
        assert_eq!(streamed.cash(), -38.0);
    }
}
