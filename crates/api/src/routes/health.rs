//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use event_store::EventStore;
use serde::Serialize;

use super::ledger::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub events: u64,
}

/// GET /health — reports status once the event store answers.
pub async fn check<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let events = state
        .ledger
        .store()
        .event_count()
        .await
        .map_err(domain::DomainError::from)?;

    Ok(Json(HealthResponse {
        status: "ok",
        events,
    }))
}
