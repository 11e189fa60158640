//! Ledger service: the single entry point used by the presentation layer.

use event_store::{EventId, EventRange, EventStore, LedgerEvent};
use projections::{History, LedgerQueries, Snapshot};

use crate::commands::{AdjustBalance, RecordPurchase, RecordSale};
use crate::error::DomainError;

/// Service for submitting events and reading derived state.
///
/// Constructed once at startup around a store handle. It keeps no other
/// state: every read replays the log.
#[derive(Clone)]
pub struct LedgerService<S: EventStore + Clone> {
    store: S,
    queries: LedgerQueries<S>,
}

impl<S: EventStore + Clone> LedgerService<S> {
    /// Creates a new ledger service with the given event store.
    pub fn new(store: S) -> Self {
        Self {
            queries: LedgerQueries::new(store.clone()),
            store,
        }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Appends an already typed event.
    #[tracing::instrument(skip(self, event), fields(kind = %event.kind()))]
    pub async fn submit(&self, event: LedgerEvent) -> Result<EventId, DomainError> {
        let kind = event.kind();

        match self.store.append(event).await {
            Ok(id) => {
                metrics::counter!("ledger_events_appended", "kind" => kind.as_str()).increment(1);
                tracing::info!(%id, "event recorded");
                Ok(id)
            }
            Err(err) => {
                let err = DomainError::from(err);
                if let Some(reason) = err.validation_reason() {
                    metrics::counter!("ledger_validation_rejections").increment(1);
                    tracing::info!(%reason, "event rejected");
                }
                Err(err)
            }
        }
    }

    /// Records a purchase from raw form input.
    #[tracing::instrument(skip(self))]
    pub async fn record_purchase(&self, cmd: RecordPurchase) -> Result<EventId, DomainError> {
        let event = self.coerce(cmd.into_event())?;
        self.submit(event).await
    }

    /// Records a sale from raw form input.
    #[tracing::instrument(skip(self))]
    pub async fn record_sale(&self, cmd: RecordSale) -> Result<EventId, DomainError> {
        let event = self.coerce(cmd.into_event())?;
        self.submit(event).await
    }

    /// Records a cash balance adjustment from raw form input.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_balance(&self, cmd: AdjustBalance) -> Result<EventId, DomainError> {
        let event = self.coerce(cmd.into_event())?;
        self.submit(event).await
    }

    /// Current stock and cash over the whole log.
    pub async fn current_state(&self) -> Result<Snapshot, DomainError> {
        Ok(self.queries.current_state().await?)
    }

    /// Events in `range` (or all of them) with the state over the whole log.
    pub async fn history(&self, range: Option<EventRange>) -> Result<History, DomainError> {
        Ok(self.queries.history(range).await?)
    }

    fn coerce(
        &self,
        parsed: Result<LedgerEvent, event_store::ValidationError>,
    ) -> Result<LedgerEvent, DomainError> {
        parsed.map_err(|reason| {
            metrics::counter!("ledger_validation_rejections").increment(1);
            tracing::info!(%reason, "submission rejected");
            DomainError::Validation(reason)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::{EventStoreExt, InMemoryEventStore, ValidationError};

    fn create_service() -> LedgerService<InMemoryEventStore> {
        LedgerService::new(InMemoryEventStore::new())
    }

    #[tokio::test]
    async fn submit_returns_assigned_id() {
        let service = create_service();

        let first = service
            .submit(LedgerEvent::buy("Widget", 10.0, 5))
            .await
            .unwrap();
        let second = service
            .submit(LedgerEvent::balance("", 2.0))
            .await
            .unwrap();

        assert_eq!(first, EventId::first());
        assert_eq!(second, EventId::new(2));
    }

    #[tokio::test]
    async fn store_validation_surfaces_as_domain_validation() {
        let service = create_service();

        let err = service
            .submit(LedgerEvent::sell("Widget", 1.0, 0))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::Validation(ValidationError::NonPositiveQuantity)
        ));
        assert!(service.store().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn raw_commands_are_recorded() {
        let service = create_service();

        service
            .record_purchase(RecordPurchase::new("Widget", "10", "5"))
            .await
            .unwrap();
        service
            .record_sale(RecordSale::new("Widget", "12", "2"))
            .await
            .unwrap();
        service
            .adjust_balance(AdjustBalance::new("rent", "-20"))
            .await
            .unwrap();

        let state = service.current_state().await.unwrap();
        assert_eq!(state.quantity_of("Widget"), Some(3));
        assert_eq!(state.cash(), -50.0 + 24.0 - 20.0);
    }

    #[tokio::test]
    async fn rejected_command_stores_nothing() {
        let service = create_service();

        let err = service
            .adjust_balance(AdjustBalance::new("fee", "three"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "value must be numeric");
        assert_eq!(service.store().event_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn oversized_trades_cannot_poison_cash() {
        let service = create_service();
        service
            .record_purchase(RecordPurchase::new("Widget", "10", "5"))
            .await
            .unwrap();

        for err in [
            service
                .record_purchase(RecordPurchase::new("W", "1e300", "4000000000"))
                .await
                .unwrap_err(),
            service
                .record_sale(RecordSale::new("W", "1e300", "4000000000"))
                .await
                .unwrap_err(),
            service
                .adjust_balance(AdjustBalance::new("", "1e308"))
                .await
                .unwrap_err(),
        ] {
            assert!(matches!(
                err,
                DomainError::Validation(ValidationError::AmountOutOfRange)
            ));
        }

        let state = service.current_state().await.unwrap();
        assert_eq!(service.store().event_count().await.unwrap(), 1);
        assert_eq!(state.cash(), -50.0);
        assert_eq!(state.cash_display(), "-50.00");
    }

    #[tokio::test]
    async fn price_reason_is_the_same_from_either_layer() {
        let service = create_service();

        let from_text = service
            .record_purchase(RecordPurchase::new("Widget", "inf", "1"))
            .await
            .unwrap_err();
        let from_event = service
            .submit(LedgerEvent::buy("Widget", f64::NAN, 1))
            .await
            .unwrap_err();

        assert_eq!(from_text.to_string(), "price must be numeric");
        assert_eq!(from_event.to_string(), from_text.to_string());
    }
}
