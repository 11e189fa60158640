//! Ledger endpoints: submissions, current state and history.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Form, Json};
use domain::{AdjustBalance, LedgerService, RecordPurchase, RecordSale};
use event_store::{EventId, EventRange, EventStore, StoredEvent};
use projections::Snapshot;
use serde::Serialize;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore + Clone> {
    pub ledger: LedgerService<S>,
}

// -- Response types --

#[derive(Serialize)]
pub struct StateResponse {
    pub stock: BTreeMap<String, i64>,
    pub cash: f64,
    pub cash_display: String,
    pub as_of: Option<EventId>,
}

impl From<Snapshot> for StateResponse {
    fn from(snapshot: Snapshot) -> Self {
        let cash_display = snapshot.cash_display();
        let as_of = snapshot.as_of();
        let (stock, cash) = snapshot.into_parts();
        Self {
            stock,
            cash,
            cash_display,
            as_of,
        }
    }
}

#[derive(Serialize)]
pub struct RecordedResponse {
    pub id: EventId,
}

#[derive(Serialize)]
pub struct ScopeResponse {
    pub from: EventId,
    pub to: EventId,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub scope: Option<ScopeResponse>,
    pub events: Vec<StoredEvent>,
    #[serde(flatten)]
    pub state: StateResponse,
}

// -- Handlers --

/// GET / — current stock and cash.
#[tracing::instrument(skip(state))]
pub async fn current_state<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<StateResponse>, ApiError> {
    let snapshot = state.ledger.current_state().await?;
    Ok(Json(snapshot.into()))
}

/// POST /buy — record a purchase.
#[tracing::instrument(skip(state))]
pub async fn buy<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Form(cmd): Form<RecordPurchase>,
) -> Result<(StatusCode, Json<RecordedResponse>), ApiError> {
    let id = state.ledger.record_purchase(cmd).await?;
    Ok((StatusCode::CREATED, Json(RecordedResponse { id })))
}

/// POST /sell — record a sale.
#[tracing::instrument(skip(state))]
pub async fn sell<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Form(cmd): Form<RecordSale>,
) -> Result<(StatusCode, Json<RecordedResponse>), ApiError> {
    let id = state.ledger.record_sale(cmd).await?;
    Ok((StatusCode::CREATED, Json(RecordedResponse { id })))
}

/// POST /balance — record a cash adjustment.
#[tracing::instrument(skip(state))]
pub async fn balance<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Form(cmd): Form<AdjustBalance>,
) -> Result<(StatusCode, Json<RecordedResponse>), ApiError> {
    let id = state.ledger.adjust_balance(cmd).await?;
    Ok((StatusCode::CREATED, Json(RecordedResponse { id })))
}

/// GET /history/ — every event plus the current state.
#[tracing::instrument(skip(state))]
pub async fn history<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<HistoryResponse>, ApiError> {
    history_for(&state, None).await
}

/// GET /history/{from}/{to}/ — events in an id window plus the current state.
///
/// The bounds may come in either order. The state is always over the whole log.
#[tracing::instrument(skip(state))]
pub async fn history_range<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((from, to)): Path<(String, String)>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let range = EventRange::between(parse_line(&from)?, parse_line(&to)?);
    history_for(&state, Some(range)).await
}

async fn history_for<S: EventStore + Clone + 'static>(
    state: &AppState<S>,
    range: Option<EventRange>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let history = state.ledger.history(range).await?;

    Ok(Json(HistoryResponse {
        scope: history.scope.map(|r| ScopeResponse {
            from: r.from_id(),
            to: r.to_id(),
        }),
        events: history.events,
        state: history.snapshot.into(),
    }))
}

fn parse_line(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid event id: {raw}")))
}
